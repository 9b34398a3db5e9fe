//! Per-instrument scan assembly.
//!
//! Takes one instrument's quote and options snapshot and produces the
//! `PositioningAnalysis` for this scan: score strikes, record touches,
//! classify, attach magnet strength and confidence, then derive ranges,
//! the primary magnet, and the aggregate confidence figures.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use heatseeker_core::{
    DealerNode, MarketRegime, NodeType, OptionsSnapshot, PositioningAnalysis, Quote, Thresholds,
};

use crate::classifier::classify_strikes;
use crate::regime::node_confidence;
use crate::scorer::{gex_value, magnet_strength, node_score, vex_value};
use crate::touch::TouchTracker;

/// Regime and timing context shared by every instrument in one scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanContext {
    pub timestamp: DateTime<Utc>,
    pub regime: MarketRegime,
    pub opex_adjustment: f64,
    pub robinhood_effect: f64,
}

/// Builds one instrument's analysis for the current scan.
#[allow(clippy::too_many_lines)]
pub fn analyze_instrument(
    symbol: &str,
    quote: &Quote,
    snapshot: &OptionsSnapshot,
    tracker: &mut TouchTracker,
    ctx: &ScanContext,
    thresholds: &Thresholds,
    previous: Option<&PositioningAnalysis>,
) -> PositioningAnalysis {
    let price = quote.price;

    let scored: Vec<(Decimal, f64)> = snapshot
        .strikes
        .iter()
        .map(|(strike, data)| (*strike, node_score(data)))
        .collect();
    let max_score = scored.iter().map(|(_, s)| *s).fold(0.0_f64, f64::max);

    // Touches are recorded before classification so this scan's nodes carry
    // this scan's sequence labels.
    for (strike, _) in &scored {
        tracker.update_touch(
            symbol,
            *strike,
            price,
            thresholds.touch_threshold_pct,
            ctx.timestamp,
        );
    }

    let types = classify_strikes(&scored, price, thresholds);

    let mut king_nodes = Vec::new();
    let mut gatekeeper_nodes = Vec::new();
    let mut put_walls = Vec::new();
    let mut call_walls = Vec::new();

    for (((strike, score), node_type), data) in scored
        .iter()
        .zip(types.iter())
        .zip(snapshot.strikes.values())
    {
        let (touch_sequence, touch_count) = tracker.touch_info(symbol, *strike);
        let node = DealerNode {
            strike: *strike,
            gex_value: gex_value(data),
            vex_value: vex_value(data),
            volume: data.total_volume(),
            open_interest: data.total_open_interest(),
            node_score: *score,
            node_type: *node_type,
            touch_sequence,
            touch_count,
            magnet_strength: magnet_strength(*strike, price, *score, max_score),
            confidence: node_confidence(
                *score,
                max_score,
                touch_sequence.hold_probability(),
                ctx.regime,
                ctx.opex_adjustment,
            ),
        };

        match node_type {
            NodeType::King => king_nodes.push(node),
            NodeType::Gatekeeper => gatekeeper_nodes.push(node),
            NodeType::PutWall => put_walls.push(node),
            NodeType::CallWall => call_walls.push(node),
            NodeType::Standard => {}
        }
    }

    let (range_low, range_high) = strike_range(&scored, price);
    let range_midpoint = (range_low + range_high) / Decimal::TWO;

    let primary_magnet = king_nodes
        .iter()
        .chain(&gatekeeper_nodes)
        .chain(&put_walls)
        .chain(&call_walls)
        .max_by(|a, b| {
            a.magnet_strength
                .partial_cmp(&b.magnet_strength)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .cloned();

    let map_stability = stability_vs_previous(previous, primary_magnet.as_ref());

    let mut analysis = PositioningAnalysis {
        timestamp: ctx.timestamp,
        underlying_symbol: symbol.to_string(),
        underlying_price: price,
        king_nodes,
        gatekeeper_nodes,
        put_walls,
        call_walls,
        range_low,
        range_high,
        range_midpoint,
        primary_magnet,
        confluence_score: 0.0,
        market_regime: ctx.regime,
        opex_adjustment: ctx.opex_adjustment,
        robinhood_effect: ctx.robinhood_effect,
        map_stability,
        overall_confidence: 0.0,
    };
    analysis.overall_confidence =
        overall_confidence(&analysis, thresholds.top_nodes_for_confidence);
    analysis
}

/// Bounds over all scored strikes; collapses to the current price when the
/// snapshot is empty.
fn strike_range(scored: &[(Decimal, f64)], price: Decimal) -> (Decimal, Decimal) {
    let mut strikes = scored.iter().map(|(s, _)| *s);
    match strikes.next() {
        None => (price, price),
        Some(first) => {
            let (mut low, mut high) = (first, first);
            for s in strikes {
                low = low.min(s);
                high = high.max(s);
            }
            (low, high)
        }
    }
}

/// Reshuffle-risk heuristic: 100 when the primary magnet strike survived
/// from the previous scan, 50 when it moved or no prior scan exists. Not a
/// full historical diff.
fn stability_vs_previous(
    previous: Option<&PositioningAnalysis>,
    primary: Option<&DealerNode>,
) -> f64 {
    match (previous.and_then(|p| p.primary_magnet.as_ref()), primary) {
        (Some(prev), Some(cur)) if prev.strike == cur.strike => 100.0,
        _ => 50.0,
    }
}

/// Mean confidence of the top-N classified nodes by score; 0 when nothing
/// classified.
fn overall_confidence(analysis: &PositioningAnalysis, top_n: usize) -> f64 {
    let mut nodes: Vec<&DealerNode> = analysis.classified_nodes().collect();
    if nodes.is_empty() || top_n == 0 {
        return 0.0;
    }
    nodes.sort_by(|a, b| {
        b.node_score
            .partial_cmp(&a.node_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let top = &nodes[..nodes.len().min(top_n)];
    top.iter().map(|n| n.confidence).sum::<f64>() / top.len() as f64
}
