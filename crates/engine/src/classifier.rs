//! Strike classification.
//!
//! Classification runs once per scan over all scored strikes of one
//! instrument. The rules are an explicit, order-dependent list so the
//! precedence (King, then Wall, then Gatekeeper, else Standard) is testable
//! in isolation. Nothing here is retained between scans; touch history is
//! persisted separately.

use rust_decimal::Decimal;

use heatseeker_core::{NodeType, Thresholds};

/// Per-strike context handed to each rule.
struct RuleCtx<'a> {
    strike: Decimal,
    score: f64,
    current_price: Decimal,
    max_score: f64,
    is_king: bool,
    thresholds: &'a Thresholds,
}

type Rule = fn(&RuleCtx) -> Option<NodeType>;

/// Rules in precedence order. The first to match wins.
const RULES: [Rule; 3] = [king_rule, wall_rule, gatekeeper_rule];

fn king_rule(ctx: &RuleCtx) -> Option<NodeType> {
    ctx.is_king.then_some(NodeType::King)
}

fn wall_rule(ctx: &RuleCtx) -> Option<NodeType> {
    if ctx.current_price <= Decimal::ZERO {
        return None;
    }
    let distance = (ctx.strike - ctx.current_price).abs();
    let window = ctx.current_price
        * Decimal::try_from(ctx.thresholds.wall_window_pct).unwrap_or(Decimal::ZERO);
    if distance > window || ctx.score <= ctx.max_score * ctx.thresholds.wall_score_ratio {
        return None;
    }
    // A strike sitting exactly at price counts as the put side.
    if ctx.strike <= ctx.current_price {
        Some(NodeType::PutWall)
    } else {
        Some(NodeType::CallWall)
    }
}

fn gatekeeper_rule(ctx: &RuleCtx) -> Option<NodeType> {
    (ctx.score > ctx.max_score * ctx.thresholds.gatekeeper_score_ratio)
        .then_some(NodeType::Gatekeeper)
}

/// Picks the King index: highest score, ties broken by smallest distance to
/// current price, then by strike ascending. Returns `None` when every score
/// is zero (the degenerate all-Standard scan).
fn king_index(strikes: &[(Decimal, f64)], current_price: Decimal, max_score: f64) -> Option<usize> {
    if max_score <= 0.0 {
        return None;
    }
    strikes
        .iter()
        .enumerate()
        .filter(|(_, (_, score))| *score == max_score)
        .min_by(|(_, (a, _)), (_, (b, _))| {
            let da = (*a - current_price).abs();
            let db = (*b - current_price).abs();
            da.cmp(&db).then(a.cmp(b))
        })
        .map(|(i, _)| i)
}

/// Assigns exactly one `NodeType` per scored strike.
#[must_use]
pub fn classify_strikes(
    strikes: &[(Decimal, f64)],
    current_price: Decimal,
    thresholds: &Thresholds,
) -> Vec<NodeType> {
    let max_score = strikes.iter().map(|(_, s)| *s).fold(0.0_f64, f64::max);
    let king = king_index(strikes, current_price, max_score);

    strikes
        .iter()
        .enumerate()
        .map(|(i, (strike, score))| {
            let ctx = RuleCtx {
                strike: *strike,
                score: *score,
                current_price,
                max_score,
                is_king: king == Some(i),
                thresholds,
            };
            RULES
                .iter()
                .find_map(|rule| rule(&ctx))
                .unwrap_or(NodeType::Standard)
        })
        .collect()
}
