//! Cross-instrument confluence.
//!
//! Compares the per-instrument analyses of a correlated set (index plus
//! tracking ETFs) and scores how much they agree: do the primary magnets
//! pull the same way, and does price sit at a similar spot inside each
//! instrument's own range. The resulting score is written back onto every
//! analysis in the set.

use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

use heatseeker_core::PositioningAnalysis;

/// Direction-agreement sub-score: 100 when every primary magnet sits on
/// the same side of its instrument's price, 60 on a majority, 20 otherwise.
/// Analyses without a primary magnet abstain; fewer than two votes scores
/// the minimum.
#[must_use]
pub fn direction_score(analyses: &[PositioningAnalysis]) -> f64 {
    let mut upward = 0_usize;
    let mut downward = 0_usize;

    for a in analyses {
        if let Some(magnet) = &a.primary_magnet {
            if magnet.strike > a.underlying_price {
                upward += 1;
            } else {
                downward += 1;
            }
        }
    }

    let total = upward + downward;
    if total < 2 {
        return 20.0;
    }
    let majority = upward.max(downward);
    if majority == total {
        100.0
    } else if majority * 2 > total {
        60.0
    } else {
        20.0
    }
}

/// Range-position sub-score: population standard deviation of each
/// instrument's normalized position inside its own `[range_low,
/// range_high]`, mapped through `max(0, 100 - stddev * 200)`.
#[must_use]
pub fn range_position_score(analyses: &[PositioningAnalysis]) -> f64 {
    let positions: Vec<f64> = analyses.iter().map(normalized_range_position).collect();
    if positions.is_empty() {
        return 0.0;
    }

    let n = positions.len() as f64;
    let mean = positions.iter().sum::<f64>() / n;
    let variance = positions.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    (100.0 - stddev * 200.0).max(0.0)
}

/// Where price sits inside the instrument's scored range, clamped to
/// [0, 1]; a degenerate range reads as the midpoint.
fn normalized_range_position(a: &PositioningAnalysis) -> f64 {
    let span = a.range_high - a.range_low;
    if span.is_zero() {
        return 0.5;
    }
    ((a.underlying_price - a.range_low) / span)
        .to_f64()
        .unwrap_or(0.5)
        .clamp(0.0, 1.0)
}

/// Scores confluence across a correlated set and assigns the same score to
/// every analysis. Fewer than two analyses is neutral: score 0, nothing
/// assigned differently.
pub fn apply_confluence(analyses: &mut [PositioningAnalysis]) -> f64 {
    if analyses.len() < 2 {
        for a in analyses.iter_mut() {
            a.confluence_score = 0.0;
        }
        return 0.0;
    }

    let direction = direction_score(analyses);
    let range_position = range_position_score(analyses);
    let score = (direction + range_position) / 2.0;

    debug!(
        direction,
        range_position,
        confluence = score,
        instruments = analyses.len(),
        "Confluence scored"
    );

    for a in analyses.iter_mut() {
        a.confluence_score = score;
    }
    score
}
