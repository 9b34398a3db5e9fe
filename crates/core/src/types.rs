//! Data model for dealer positioning analysis.
//!
//! This module defines the strike-level node types produced by the scoring
//! and classification pipeline, the per-scan analysis container, and the
//! signal report consumed by downstream alerting.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Classification of a strike within one scan.
///
/// Exactly one type is assigned per strike per scan. Classification is
/// order-dependent: King is checked first, then Walls, then Gatekeeper,
/// with Standard as the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    /// The single highest-scored strike; strongest dealer attraction point
    King,
    /// Secondary high-score strike between price and the King
    Gatekeeper,
    /// Near-price strike below current price expected to act as support
    PutWall,
    /// Near-price strike above current price expected to act as resistance
    CallWall,
    /// Everything else
    Standard,
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::King => write!(f, "KING"),
            Self::Gatekeeper => write!(f, "GATEKEEPER"),
            Self::PutWall => write!(f, "PUT_WALL"),
            Self::CallWall => write!(f, "CALL_WALL"),
            Self::Standard => write!(f, "STANDARD"),
        }
    }
}

/// How many times price has revisited a strike.
///
/// Sequences only advance forward; a strike never returns to an earlier
/// label within the life of its history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TouchSequence {
    /// Price has never come within the touch threshold
    Untested,
    /// One recorded touch
    First,
    /// Two recorded touches
    Second,
    /// Three or more recorded touches
    ThirdPlus,
}

impl TouchSequence {
    /// Maps a touch count to its sequence label.
    #[must_use]
    pub const fn from_count(count: u32) -> Self {
        match count {
            0 => Self::Untested,
            1 => Self::First,
            2 => Self::Second,
            _ => Self::ThirdPlus,
        }
    }

    /// Probability (0-100) that the level holds, given how often it has
    /// been tested. Untested and first-test levels are statistically more
    /// likely to hold; repeated tests erode reliability.
    #[must_use]
    pub const fn hold_probability(self) -> f64 {
        match self {
            Self::Untested => 85.0,
            Self::First => 75.0,
            Self::Second => 60.0,
            Self::ThirdPlus => 40.0,
        }
    }
}

impl std::fmt::Display for TouchSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Untested => write!(f, "untested"),
            Self::First => write!(f, "first"),
            Self::Second => write!(f, "second"),
            Self::ThirdPlus => write!(f, "third+"),
        }
    }
}

/// Persisted touch-history entry for one (instrument, strike) pair.
///
/// Field names are stable; entries survive process restarts via the
/// touch store and are never deleted within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchRecord {
    /// Number of recorded touches; monotonically non-decreasing
    pub count: u32,
    /// Label derived from `count`
    pub sequence: TouchSequence,
    /// When the first touch was recorded
    pub first_touch: DateTime<Utc>,
    /// When the most recent touch was recorded
    pub last_touch: DateTime<Utc>,
}

impl TouchRecord {
    /// Creates the entry for a first touch.
    #[must_use]
    pub fn first(now: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            sequence: TouchSequence::First,
            first_touch: now,
            last_touch: now,
        }
    }

    /// Records another touch, advancing count and sequence.
    pub fn record_touch(&mut self, now: DateTime<Utc>) {
        self.count = self.count.saturating_add(1);
        self.sequence = TouchSequence::from_count(self.count);
        self.last_touch = now;
    }
}

/// Volatility regime derived from cross-instrument price changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketRegime {
    /// Average absolute change < 0.5%
    LowVol,
    /// Average absolute change < 1.5%
    NormalVol,
    /// Average absolute change < 3.0%
    HighVol,
    /// Everything above
    ExtremeVol,
}

impl MarketRegime {
    /// Classifies a regime from the mean absolute percent change across
    /// tracked instruments.
    #[must_use]
    pub fn from_average_change(avg_abs_change_pct: f64) -> Self {
        if avg_abs_change_pct < 0.5 {
            Self::LowVol
        } else if avg_abs_change_pct < 1.5 {
            Self::NormalVol
        } else if avg_abs_change_pct < 3.0 {
            Self::HighVol
        } else {
            Self::ExtremeVol
        }
    }

    /// Multiplier applied to node confidence under this regime.
    #[must_use]
    pub const fn confidence_multiplier(self) -> f64 {
        match self {
            Self::LowVol => 1.1,
            Self::NormalVol => 1.0,
            Self::HighVol => 0.9,
            Self::ExtremeVol => 0.7,
        }
    }
}

/// One strike's dealer-positioning state for one instrument at one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealerNode {
    /// Strike price level
    pub strike: Decimal,
    /// Net gamma exposure estimate; calls contribute positively, puts
    /// negatively, x100 contract multiplier
    pub gex_value: f64,
    /// Vanna exposure estimate (volume-weighted analogue of GEX; no vanna
    /// input exists in the adapter schema)
    pub vex_value: f64,
    /// Combined call + put volume
    pub volume: u64,
    /// Combined call + put open interest
    pub open_interest: u64,
    /// Composite score; non-negative
    pub node_score: f64,
    /// Classification for this scan
    pub node_type: NodeType,
    /// Touch sequence from persisted history
    pub touch_sequence: TouchSequence,
    /// Touch count from persisted history
    pub touch_count: u32,
    /// Distance-discounted attraction, 0-100
    pub magnet_strength: f64,
    /// Final reliability estimate, 0-100
    pub confidence: f64,
}

impl DealerNode {
    /// Absolute distance from the given price to this node's strike.
    #[must_use]
    pub fn distance(&self, price: Decimal) -> Decimal {
        (self.strike - price).abs()
    }

    /// Distance as a fraction of the given price (0.02 = 2%).
    /// Returns 0.0 for a non-positive price.
    #[must_use]
    pub fn distance_pct(&self, price: Decimal) -> f64 {
        if price <= Decimal::ZERO {
            return 0.0;
        }
        (self.distance(price) / price).to_f64().unwrap_or(0.0)
    }
}

/// One scan's output for one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositioningAnalysis {
    /// When the scan ran
    pub timestamp: DateTime<Utc>,
    /// Instrument symbol
    pub underlying_symbol: String,
    /// Underlying price at scan time
    pub underlying_price: Decimal,
    /// King node(s); one in practice
    pub king_nodes: Vec<DealerNode>,
    /// Gatekeeper nodes
    pub gatekeeper_nodes: Vec<DealerNode>,
    /// Put walls (support, below price)
    pub put_walls: Vec<DealerNode>,
    /// Call walls (resistance, above price)
    pub call_walls: Vec<DealerNode>,
    /// Lowest scored strike
    pub range_low: Decimal,
    /// Highest scored strike
    pub range_high: Decimal,
    /// Midpoint of the scored range
    pub range_midpoint: Decimal,
    /// Node with the highest magnet strength across classified nodes
    pub primary_magnet: Option<DealerNode>,
    /// Cross-instrument agreement, 0-100; 0 until aggregation runs
    pub confluence_score: f64,
    /// Volatility regime at scan time
    pub market_regime: MarketRegime,
    /// Options-expiration week multiplier, (0, 2]
    pub opex_adjustment: f64,
    /// Late-session liquidation multiplier, (0, 2]; informational only,
    /// not folded into node confidence
    pub robinhood_effect: f64,
    /// Reshuffle-risk heuristic, 0-100
    pub map_stability: f64,
    /// Mean confidence of the top-scored nodes, 0-100
    pub overall_confidence: f64,
}

impl PositioningAnalysis {
    /// Iterates all classified (non-Standard) nodes.
    pub fn classified_nodes(&self) -> impl Iterator<Item = &DealerNode> {
        self.king_nodes
            .iter()
            .chain(&self.gatekeeper_nodes)
            .chain(&self.put_walls)
            .chain(&self.call_walls)
    }

    /// Returns true if no strike was classified above Standard.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classified_nodes().next().is_none()
    }
}

/// Direction of an emitted trade candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    /// Bullish candidate
    Call,
    /// Bearish candidate
    Put,
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "CALL"),
            Self::Put => write!(f, "PUT"),
        }
    }
}

/// A single ranked trade candidate derived from a classified node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingSignal {
    /// Candidate direction
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    /// Strike of the originating node
    pub strike: Decimal,
    /// Confidence carried over from the node, 0-100
    pub confidence: f64,
    /// Human-readable reason, e.g. "King Node first touch"
    pub entry_reason: String,
    /// Absolute distance from current price
    pub distance: Decimal,
    /// Distance as a fraction of current price
    pub distance_pct: f64,
    /// Magnet strength of the originating node
    pub magnet_strength: f64,
    /// Score of the originating node
    pub node_score: f64,
}

/// The full signal-consumer payload for one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalReport {
    /// When the underlying scan ran
    pub timestamp: DateTime<Utc>,
    /// Instrument symbol
    pub symbol: String,
    /// Underlying price at scan time
    pub current_price: Decimal,
    /// Ranked candidates, best first, at most five
    pub signals: Vec<TradingSignal>,
    /// Volatility regime
    pub market_regime: MarketRegime,
    /// Cross-instrument agreement
    pub confluence_score: f64,
    /// Mean confidence of the top nodes
    pub overall_confidence: f64,
    /// OPEX-week multiplier
    pub opex_adjustment: f64,
    /// Late-session multiplier
    pub robinhood_effect: f64,
    /// Strongest magnet node, if any
    pub primary_magnet: Option<DealerNode>,
}

/// Current quote for one instrument, as supplied by the market data adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Last traded price
    pub price: Decimal,
    /// Session percent change (1.0 = +1%)
    pub change_percent: f64,
    /// Session volume
    pub volume: u64,
}

/// Per-strike options activity, calls and puts separated.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrikeData {
    pub call_volume: u64,
    pub put_volume: u64,
    pub call_open_interest: u64,
    pub put_open_interest: u64,
    pub call_gamma: f64,
    pub put_gamma: f64,
}

impl StrikeData {
    /// Combined call + put volume.
    #[must_use]
    pub const fn total_volume(&self) -> u64 {
        self.call_volume + self.put_volume
    }

    /// Combined call + put open interest.
    #[must_use]
    pub const fn total_open_interest(&self) -> u64 {
        self.call_open_interest + self.put_open_interest
    }

    /// Mean of call and put gamma.
    #[must_use]
    pub fn average_gamma(&self) -> f64 {
        (self.call_gamma + self.put_gamma) / 2.0
    }
}

/// One instrument's options snapshot: strike → activity, sorted by strike.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionsSnapshot {
    /// Strike-keyed activity map
    pub strikes: BTreeMap<Decimal, StrikeData>,
}

impl OptionsSnapshot {
    /// Returns true if the snapshot carries no strikes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // ============================================
    // NodeType Tests
    // ============================================

    #[test]
    fn node_type_serializes_screaming_snake() {
        assert_eq!(serde_json::to_string(&NodeType::King).unwrap(), "\"KING\"");
        assert_eq!(
            serde_json::to_string(&NodeType::PutWall).unwrap(),
            "\"PUT_WALL\""
        );
        assert_eq!(
            serde_json::to_string(&NodeType::CallWall).unwrap(),
            "\"CALL_WALL\""
        );
    }

    #[test]
    fn node_type_display_matches_wire_form() {
        assert_eq!(NodeType::Gatekeeper.to_string(), "GATEKEEPER");
        assert_eq!(NodeType::Standard.to_string(), "STANDARD");
    }

    // ============================================
    // TouchSequence Tests
    // ============================================

    #[test]
    fn touch_sequence_from_count_maps_correctly() {
        assert_eq!(TouchSequence::from_count(0), TouchSequence::Untested);
        assert_eq!(TouchSequence::from_count(1), TouchSequence::First);
        assert_eq!(TouchSequence::from_count(2), TouchSequence::Second);
        assert_eq!(TouchSequence::from_count(3), TouchSequence::ThirdPlus);
        assert_eq!(TouchSequence::from_count(17), TouchSequence::ThirdPlus);
    }

    #[test]
    fn touch_sequence_probabilities_decay() {
        assert!((TouchSequence::Untested.hold_probability() - 85.0).abs() < f64::EPSILON);
        assert!((TouchSequence::First.hold_probability() - 75.0).abs() < f64::EPSILON);
        assert!((TouchSequence::Second.hold_probability() - 60.0).abs() < f64::EPSILON);
        assert!((TouchSequence::ThirdPlus.hold_probability() - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn touch_sequence_ordering_advances_forward() {
        assert!(TouchSequence::Untested < TouchSequence::First);
        assert!(TouchSequence::First < TouchSequence::Second);
        assert!(TouchSequence::Second < TouchSequence::ThirdPlus);
    }

    // ============================================
    // TouchRecord Tests
    // ============================================

    #[test]
    fn touch_record_first_then_advances() {
        let t0 = Utc::now();
        let mut rec = TouchRecord::first(t0);
        assert_eq!(rec.count, 1);
        assert_eq!(rec.sequence, TouchSequence::First);

        let t1 = t0 + chrono::Duration::seconds(30);
        rec.record_touch(t1);
        assert_eq!(rec.count, 2);
        assert_eq!(rec.sequence, TouchSequence::Second);
        assert_eq!(rec.first_touch, t0);
        assert_eq!(rec.last_touch, t1);

        rec.record_touch(t1 + chrono::Duration::seconds(30));
        assert_eq!(rec.count, 3);
        assert_eq!(rec.sequence, TouchSequence::ThirdPlus);
    }

    #[test]
    fn touch_record_roundtrips_json_with_stable_names() {
        let rec = TouchRecord::first(Utc::now());
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"count\":1"));
        assert!(json.contains("\"sequence\":\"FIRST\""));
        assert!(json.contains("\"first_touch\""));
        assert!(json.contains("\"last_touch\""));

        let back: TouchRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }

    // ============================================
    // MarketRegime Tests
    // ============================================

    #[test]
    fn regime_thresholds_classify_correctly() {
        assert_eq!(MarketRegime::from_average_change(0.2), MarketRegime::LowVol);
        assert_eq!(
            MarketRegime::from_average_change(0.5),
            MarketRegime::NormalVol
        );
        assert_eq!(
            MarketRegime::from_average_change(1.4),
            MarketRegime::NormalVol
        );
        assert_eq!(MarketRegime::from_average_change(2.9), MarketRegime::HighVol);
        assert_eq!(
            MarketRegime::from_average_change(3.0),
            MarketRegime::ExtremeVol
        );
    }

    #[test]
    fn regime_multipliers_match_contract() {
        assert!((MarketRegime::LowVol.confidence_multiplier() - 1.1).abs() < f64::EPSILON);
        assert!((MarketRegime::NormalVol.confidence_multiplier() - 1.0).abs() < f64::EPSILON);
        assert!((MarketRegime::HighVol.confidence_multiplier() - 0.9).abs() < f64::EPSILON);
        assert!((MarketRegime::ExtremeVol.confidence_multiplier() - 0.7).abs() < f64::EPSILON);
    }

    // ============================================
    // DealerNode Tests
    // ============================================

    fn node(strike: Decimal) -> DealerNode {
        DealerNode {
            strike,
            gex_value: 0.0,
            vex_value: 0.0,
            volume: 100,
            open_interest: 200,
            node_score: 1000.0,
            node_type: NodeType::Standard,
            touch_sequence: TouchSequence::Untested,
            touch_count: 0,
            magnet_strength: 0.0,
            confidence: 0.0,
        }
    }

    #[test]
    fn dealer_node_distance_is_absolute() {
        let n = node(dec!(105));
        assert_eq!(n.distance(dec!(100)), dec!(5));
        assert_eq!(n.distance(dec!(110)), dec!(5));
    }

    #[test]
    fn dealer_node_distance_pct_relative_to_price() {
        let n = node(dec!(102));
        assert!((n.distance_pct(dec!(100)) - 0.02).abs() < 1e-12);
        assert!((n.distance_pct(Decimal::ZERO)).abs() < f64::EPSILON);
    }

    #[test]
    fn dealer_node_serializes_camel_case() {
        let json = serde_json::to_string(&node(dec!(100))).unwrap();
        assert!(json.contains("\"gexValue\""));
        assert!(json.contains("\"nodeScore\""));
        assert!(json.contains("\"touchSequence\":\"UNTESTED\""));
        assert!(json.contains("\"magnetStrength\""));
    }

    // ============================================
    // PositioningAnalysis Tests
    // ============================================

    fn empty_analysis() -> PositioningAnalysis {
        PositioningAnalysis {
            timestamp: Utc::now(),
            underlying_symbol: "SPY".to_string(),
            underlying_price: dec!(500),
            king_nodes: vec![],
            gatekeeper_nodes: vec![],
            put_walls: vec![],
            call_walls: vec![],
            range_low: Decimal::ZERO,
            range_high: Decimal::ZERO,
            range_midpoint: Decimal::ZERO,
            primary_magnet: None,
            confluence_score: 0.0,
            market_regime: MarketRegime::NormalVol,
            opex_adjustment: 1.0,
            robinhood_effect: 1.0,
            map_stability: 50.0,
            overall_confidence: 0.0,
        }
    }

    #[test]
    fn analysis_classified_nodes_walks_all_sets() {
        let mut a = empty_analysis();
        assert!(a.is_empty());

        a.king_nodes.push(node(dec!(500)));
        a.put_walls.push(node(dec!(495)));
        a.call_walls.push(node(dec!(505)));
        a.gatekeeper_nodes.push(node(dec!(490)));

        assert_eq!(a.classified_nodes().count(), 4);
        assert!(!a.is_empty());
    }

    #[test]
    fn trading_signal_type_field_renamed() {
        let sig = TradingSignal {
            signal_type: SignalType::Put,
            strike: dec!(495),
            confidence: 70.0,
            entry_reason: "King Node first touch".to_string(),
            distance: dec!(5),
            distance_pct: 0.01,
            magnet_strength: 80.0,
            node_score: 1000.0,
        };
        let json = serde_json::to_string(&sig).unwrap();
        assert!(json.contains("\"type\":\"PUT\""));
        assert!(json.contains("\"entryReason\""));
        assert!(json.contains("\"distancePct\""));
    }

    // ============================================
    // StrikeData / OptionsSnapshot Tests
    // ============================================

    #[test]
    fn strike_data_totals_combine_calls_and_puts() {
        let d = StrikeData {
            call_volume: 100,
            put_volume: 50,
            call_open_interest: 2000,
            put_open_interest: 1000,
            call_gamma: 0.004,
            put_gamma: 0.002,
        };
        assert_eq!(d.total_volume(), 150);
        assert_eq!(d.total_open_interest(), 3000);
        assert!((d.average_gamma() - 0.003).abs() < 1e-12);
    }

    #[test]
    fn options_snapshot_iterates_strikes_ascending() {
        let mut snap = OptionsSnapshot::default();
        snap.strikes.insert(dec!(105), StrikeData::default());
        snap.strikes.insert(dec!(95), StrikeData::default());
        snap.strikes.insert(dec!(100), StrikeData::default());

        let strikes: Vec<Decimal> = snap.strikes.keys().copied().collect();
        assert_eq!(strikes, vec![dec!(95), dec!(100), dec!(105)]);
    }
}
