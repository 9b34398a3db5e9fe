pub mod config;
pub mod config_loader;
pub mod traits;
pub mod types;

pub use config::{EngineConfig, Thresholds, TouchResetPolicy};
pub use config_loader::ConfigLoader;
pub use traits::{MarketCalendar, MarketDataProvider, SystemCalendar, TouchStore};
pub use types::{
    DealerNode, MarketRegime, NodeType, OptionsSnapshot, PositioningAnalysis, Quote, SignalReport,
    SignalType, StrikeData, TouchRecord, TouchSequence, TradingSignal,
};
