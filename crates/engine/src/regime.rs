//! Market regime detection and calendar-based confidence adjustments.
//!
//! The OPEX window and "power hour" checks are calendar heuristics, read
//! through `MarketCalendar` so they never depend on the wall clock directly
//! and can be corrected without touching scoring.

use heatseeker_core::{MarketCalendar, MarketRegime};

/// Day-of-month window treated as options-expiration week.
const OPEX_DAYS: std::ops::RangeInclusive<u32> = 15..=20;

/// Confidence multiplier during options-expiration week.
const OPEX_MULTIPLIER: f64 = 0.8;

/// Multiplier applied to the late-session liquidation factor.
const POWER_HOUR_MULTIPLIER: f64 = 1.2;

/// Weight of the score-derived component in final confidence.
const SCORE_WEIGHT: f64 = 0.6;

/// Weight of the touch-probability component in final confidence.
const TOUCH_WEIGHT: f64 = 0.4;

/// Detects the volatility regime from per-instrument session changes
/// (mean absolute percent change). An empty slice reads as normal.
#[must_use]
pub fn detect_regime(change_percents: &[f64]) -> MarketRegime {
    if change_percents.is_empty() {
        return MarketRegime::NormalVol;
    }
    let avg = change_percents.iter().map(|c| c.abs()).sum::<f64>() / change_percents.len() as f64;
    MarketRegime::from_average_change(avg)
}

/// OPEX-week confidence multiplier: x0.8 when the day of month falls in the
/// 15-20 window, x1.0 otherwise. A heuristic for the third-Friday week, not
/// an actual expiration-date computation.
#[must_use]
pub fn opex_adjustment(calendar: &dyn MarketCalendar) -> f64 {
    if OPEX_DAYS.contains(&calendar.day_of_month()) {
        OPEX_MULTIPLIER
    } else {
        1.0
    }
}

/// Late-session ("power hour") liquidation factor: x1.2 during local hours
/// 15-16, x1.0 otherwise. Exposed on the analysis for consumers to apply;
/// never folded into node confidence here.
#[must_use]
pub fn robinhood_effect(calendar: &dyn MarketCalendar) -> f64 {
    if matches!(calendar.local_hour(), 15 | 16) {
        POWER_HOUR_MULTIPLIER
    } else {
        1.0
    }
}

/// Final node confidence: a 60/40 blend of the score-derived component and
/// the touch-hold probability, scaled by regime and OPEX multipliers,
/// clamped into [0, 100]. All-zero scores yield zero confidence.
#[must_use]
pub fn node_confidence(
    score: f64,
    max_score: f64,
    touch_probability: f64,
    regime: MarketRegime,
    opex_multiplier: f64,
) -> f64 {
    if max_score <= 0.0 {
        return 0.0;
    }
    let score_confidence = (score / max_score * 100.0).min(100.0);
    let blended = SCORE_WEIGHT * score_confidence + TOUCH_WEIGHT * touch_probability;
    (blended * regime.confidence_multiplier() * opex_multiplier).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use heatseeker_core::TouchSequence;

    struct FixedCalendar {
        day: u32,
        hour: u32,
    }

    impl MarketCalendar for FixedCalendar {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
        fn day_of_month(&self) -> u32 {
            self.day
        }
        fn local_hour(&self) -> u32 {
            self.hour
        }
    }

    #[test]
    fn regime_detection_averages_absolute_changes() {
        assert_eq!(detect_regime(&[0.2, -0.3]), MarketRegime::LowVol);
        assert_eq!(detect_regime(&[1.0, -1.2]), MarketRegime::NormalVol);
        assert_eq!(detect_regime(&[2.0, -2.5]), MarketRegime::HighVol);
        assert_eq!(detect_regime(&[4.0, -3.5]), MarketRegime::ExtremeVol);
        assert_eq!(detect_regime(&[]), MarketRegime::NormalVol);
    }

    #[test]
    fn opex_window_is_day_15_through_20() {
        for day in 15..=20 {
            let cal = FixedCalendar { day, hour: 10 };
            assert!((opex_adjustment(&cal) - 0.8).abs() < f64::EPSILON);
        }
        for day in [1, 5, 14, 21, 28] {
            let cal = FixedCalendar { day, hour: 10 };
            assert!((opex_adjustment(&cal) - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn opex_week_scales_confidence_by_exactly_0_8() {
        // day 17 vs day 5, all else equal
        let opex_day = FixedCalendar { day: 17, hour: 10 };
        let normal_day = FixedCalendar { day: 5, hour: 10 };

        let on_opex = node_confidence(
            800.0,
            1000.0,
            TouchSequence::First.hold_probability(),
            MarketRegime::NormalVol,
            opex_adjustment(&opex_day),
        );
        let off_opex = node_confidence(
            800.0,
            1000.0,
            TouchSequence::First.hold_probability(),
            MarketRegime::NormalVol,
            opex_adjustment(&normal_day),
        );
        assert!((on_opex / off_opex - 0.8).abs() < 1e-9);
    }

    #[test]
    fn power_hour_is_local_15_and_16() {
        for hour in [15, 16] {
            let cal = FixedCalendar { day: 5, hour };
            assert!((robinhood_effect(&cal) - 1.2).abs() < f64::EPSILON);
        }
        for hour in [0, 9, 14, 17, 23] {
            let cal = FixedCalendar { day: 5, hour };
            assert!((robinhood_effect(&cal) - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn confidence_blends_score_and_touch_components() {
        // score part = 80, touch part = 75: 0.6*80 + 0.4*75 = 78
        let c = node_confidence(800.0, 1000.0, 75.0, MarketRegime::NormalVol, 1.0);
        assert!((c - 78.0).abs() < 1e-9);
    }

    #[test]
    fn confidence_clamps_to_100() {
        let c = node_confidence(1000.0, 1000.0, 85.0, MarketRegime::LowVol, 1.5);
        assert!((c - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn confidence_zero_when_max_score_zero() {
        let c = node_confidence(0.0, 0.0, 85.0, MarketRegime::LowVol, 1.0);
        assert!(c.abs() < f64::EPSILON);
    }

    #[test]
    fn confidence_never_leaves_bounds_under_extreme_multipliers() {
        for mult in [0.01, 0.8, 1.0, 2.0] {
            for regime in [
                MarketRegime::LowVol,
                MarketRegime::NormalVol,
                MarketRegime::HighVol,
                MarketRegime::ExtremeVol,
            ] {
                let c = node_confidence(1000.0, 1000.0, 85.0, regime, mult);
                assert!((0.0..=100.0).contains(&c));
            }
        }
    }
}
