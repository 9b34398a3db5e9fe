//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Instruments scanned together (correlated set, e.g. SPX + SPY + QQQ)
    pub symbols: Vec<String>,
    /// Seconds between scans in loop mode
    pub poll_interval_secs: u64,
    /// Bound on each market-data fetch
    pub fetch_timeout_secs: u64,
    /// Path of the file-backed touch history store
    pub touch_store_path: String,
    /// When persisted touch history is discarded
    pub touch_reset: TouchResetPolicy,
    /// Tunable scoring/classification thresholds
    pub thresholds: Thresholds,
}

/// Reset policy for persisted touch history.
///
/// The original system never clears touch history; `Daily` drops entries
/// whose last touch is from a previous UTC day at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchResetPolicy {
    /// Touch history persists indefinitely
    Never,
    /// Stale entries are dropped at the start of each UTC day
    Daily,
}

/// Tunable thresholds for scoring, classification, and signal emission.
///
/// Defaults are the normative constants; tests pin them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    /// Price-to-strike distance counted as a touch (fraction of price)
    pub touch_threshold_pct: f64,
    /// Wall classification window around price (fraction of price)
    pub wall_window_pct: f64,
    /// Minimum score relative to max for wall classification
    pub wall_score_ratio: f64,
    /// Minimum score relative to max for gatekeeper classification
    pub gatekeeper_score_ratio: f64,
    /// King signal emission window (fraction of price)
    pub king_signal_window_pct: f64,
    /// Wall signal emission window (fraction of price)
    pub wall_signal_window_pct: f64,
    /// Maximum signals emitted per instrument
    pub max_signals: usize,
    /// Node count averaged into overall confidence
    pub top_nodes_for_confidence: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            touch_threshold_pct: 0.005,
            wall_window_pct: 0.02,
            wall_score_ratio: 0.6,
            gatekeeper_score_ratio: 0.4,
            king_signal_window_pct: 0.02,
            wall_signal_window_pct: 0.01,
            max_signals: 5,
            top_nodes_for_confidence: 5,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["SPY".to_string(), "QQQ".to_string(), "IWM".to_string()],
            poll_interval_secs: 30,
            fetch_timeout_secs: 15,
            touch_store_path: "data/touch_history.json".to_string(),
            touch_reset: TouchResetPolicy::Never,
            thresholds: Thresholds::default(),
        }
    }
}
