//! Dealer positioning analysis engine ("heatseeker").
//!
//! Ingests per-strike options market data for a correlated instrument set
//! and produces a ranked, confidence-scored map of where dealer hedging
//! flows are likely to attract or repel price: King and Gatekeeper nodes,
//! put/call walls, touch-sequence reliability decay, volatility-regime and
//! calendar adjustments, cross-instrument confluence, and trade-candidate
//! signals.

pub mod analysis;
pub mod classifier;
pub mod confluence;
pub mod engine;
pub mod regime;
pub mod scorer;
pub mod signal;
pub mod touch;

pub use analysis::{analyze_instrument, ScanContext};
pub use classifier::classify_strikes;
pub use confluence::{apply_confluence, direction_score, range_position_score};
pub use engine::HeatseekerEngine;
pub use regime::{detect_regime, node_confidence, opex_adjustment, robinhood_effect};
pub use scorer::{gex_value, magnet_strength, node_score, vex_value};
pub use signal::{build_report, generate_signals};
pub use touch::{touch_key, TouchTracker};
