//! Strike-level scoring.
//!
//! The composite node score rewards strikes where both trading activity and
//! resting positioning concentrate, tilted by gamma: score is volume times
//! open interest, scaled by a gamma weight. Gamma is expected in typical
//! per-contract units (roughly 0 to 0.01); the `1 + gamma * 1000` weight
//! assumes those units and callers must supply gamma accordingly.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use heatseeker_core::StrikeData;

/// Contract multiplier applied to exposure estimates.
const CONTRACT_MULTIPLIER: f64 = 100.0;

/// Composite score for one strike. Zero volume or open interest yields
/// zero, which is valid and simply ranks last.
#[must_use]
pub fn node_score(data: &StrikeData) -> f64 {
    let base = data.total_volume() as f64 * data.total_open_interest() as f64;
    if base == 0.0 {
        return 0.0;
    }
    let gamma_weight = 1.0 + data.average_gamma() * 1000.0;
    (base * gamma_weight).max(0.0)
}

/// Net gamma exposure estimate. Calls contribute positively, puts
/// negatively, per the documented convention.
#[must_use]
pub fn gex_value(data: &StrikeData) -> f64 {
    (data.call_gamma * data.call_open_interest as f64
        - data.put_gamma * data.put_open_interest as f64)
        * CONTRACT_MULTIPLIER
}

/// Vanna exposure estimate. The adapter schema carries no vanna, so this is
/// the volume-weighted analogue of GEX, same sign convention.
#[must_use]
pub fn vex_value(data: &StrikeData) -> f64 {
    (data.call_gamma * data.call_volume as f64 - data.put_gamma * data.put_volume as f64)
        * CONTRACT_MULTIPLIER
}

/// Distance-discounted attraction in [0, 100].
///
/// `(score / max_score) * (1 / (1 + distance / price)) * 100` — a high-score
/// strike at the money beats an equally-scored strike further away. Returns
/// 0 when `max_score` is 0 rather than dividing by zero.
#[must_use]
pub fn magnet_strength(strike: Decimal, current_price: Decimal, score: f64, max_score: f64) -> f64 {
    if max_score <= 0.0 || current_price <= Decimal::ZERO {
        return 0.0;
    }
    let distance = (strike - current_price).abs();
    let distance_ratio = (distance / current_price).to_f64().unwrap_or(0.0);
    ((score / max_score) * (1.0 / (1.0 + distance_ratio)) * 100.0).clamp(0.0, 100.0)
}
