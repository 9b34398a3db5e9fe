//! Signal generation.
//!
//! Turns one instrument's classified nodes into a ranked list of trade
//! candidates. King nodes near price emit a signal toward the magnet; walls
//! near price emit the opposite-direction signal, expecting a rejection.
//! Output is sorted by confidence and truncated; an empty list is a valid
//! result, not an error.

use heatseeker_core::{
    DealerNode, PositioningAnalysis, SignalReport, SignalType, Thresholds, TradingSignal,
};

/// Builds the ranked signal list for one analysis.
#[must_use]
pub fn generate_signals(
    analysis: &PositioningAnalysis,
    thresholds: &Thresholds,
) -> Vec<TradingSignal> {
    let price = analysis.underlying_price;
    let mut signals = Vec::new();

    // King nodes: trade toward the magnet when price is close enough.
    for node in &analysis.king_nodes {
        if node.distance_pct(price) > thresholds.king_signal_window_pct {
            continue;
        }
        let signal_type = if node.strike < price {
            SignalType::Put
        } else {
            SignalType::Call
        };
        signals.push(signal_from_node(
            node,
            analysis,
            signal_type,
            format!("King Node {} touch", node.touch_sequence),
        ));
    }

    // Walls: expect rejection, so the signal points away from the wall.
    for node in &analysis.put_walls {
        if node.distance_pct(price) <= thresholds.wall_signal_window_pct {
            signals.push(signal_from_node(
                node,
                analysis,
                SignalType::Call,
                format!("Put Wall {} touch", node.touch_sequence),
            ));
        }
    }
    for node in &analysis.call_walls {
        if node.distance_pct(price) <= thresholds.wall_signal_window_pct {
            signals.push(signal_from_node(
                node,
                analysis,
                SignalType::Put,
                format!("Call Wall {} touch", node.touch_sequence),
            ));
        }
    }

    signals.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    signals.truncate(thresholds.max_signals);
    signals
}

fn signal_from_node(
    node: &DealerNode,
    analysis: &PositioningAnalysis,
    signal_type: SignalType,
    entry_reason: String,
) -> TradingSignal {
    let price = analysis.underlying_price;
    TradingSignal {
        signal_type,
        strike: node.strike,
        confidence: node.confidence,
        entry_reason,
        distance: node.distance(price),
        distance_pct: node.distance_pct(price),
        magnet_strength: node.magnet_strength,
        node_score: node.node_score,
    }
}

/// Assembles the full consumer-facing report for one instrument.
#[must_use]
pub fn build_report(analysis: &PositioningAnalysis, thresholds: &Thresholds) -> SignalReport {
    SignalReport {
        timestamp: analysis.timestamp,
        symbol: analysis.underlying_symbol.clone(),
        current_price: analysis.underlying_price,
        signals: generate_signals(analysis, thresholds),
        market_regime: analysis.market_regime,
        confluence_score: analysis.confluence_score,
        overall_confidence: analysis.overall_confidence,
        opex_adjustment: analysis.opex_adjustment,
        robinhood_effect: analysis.robinhood_effect,
        primary_magnet: analysis.primary_magnet.clone(),
    }
}
