//! Persistence and data adapters for the positioning engine.

pub mod error;
pub mod sim;
pub mod store;

pub use error::StoreError;
pub use sim::SimulatedDataProvider;
pub use store::{JsonTouchStore, MemoryTouchStore};
