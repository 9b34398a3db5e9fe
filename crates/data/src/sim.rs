//! Simulated market data provider.
//!
//! Generates plausible quotes and option chains for demos and tests when no
//! real options feed is wired in. This lives in the data crate as an
//! adapter, deliberately apart from the scoring pipeline, which only ever
//! sees the `MarketDataProvider` trait.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use anyhow::{bail, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use heatseeker_core::{MarketDataProvider, OptionsSnapshot, Quote, StrikeData};

/// Fake adapter producing synthetic chains around a configured spot price.
pub struct SimulatedDataProvider {
    /// Base price per known symbol
    prices: HashMap<String, Decimal>,
    /// Distance between adjacent strikes
    strike_spacing: Decimal,
    /// Strikes generated on each side of spot
    strikes_per_side: u32,
    rng: Mutex<StdRng>,
}

impl SimulatedDataProvider {
    /// Creates a provider with the given per-symbol spot prices.
    #[must_use]
    pub fn new(prices: HashMap<String, Decimal>) -> Self {
        Self::with_seed(prices, rand::random())
    }

    /// Creates a provider with a fixed RNG seed so tests are repeatable.
    #[must_use]
    pub fn with_seed(prices: HashMap<String, Decimal>, seed: u64) -> Self {
        Self {
            prices,
            strike_spacing: Decimal::ONE,
            strikes_per_side: 10,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Sets the distance between adjacent generated strikes.
    #[must_use]
    pub fn with_strike_spacing(mut self, spacing: Decimal) -> Self {
        self.strike_spacing = spacing;
        self
    }

    fn base_price(&self, symbol: &str) -> Result<Decimal> {
        match self.prices.get(symbol) {
            Some(p) => Ok(*p),
            None => bail!("unknown symbol: {symbol}"),
        }
    }
}

#[async_trait]
impl MarketDataProvider for SimulatedDataProvider {
    async fn quote(&self, symbol: &str) -> Result<Quote> {
        let base = self.base_price(symbol)?;
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        // Drift spot up to +/-1% and report a session change up to +/-2%.
        let drift = rng.gen_range(-0.01..0.01);
        let change_percent = rng.gen_range(-2.0..2.0);
        let price = base * Decimal::from_f64(1.0 + drift).unwrap_or(Decimal::ONE);

        Ok(Quote {
            price: price.round_dp(2),
            change_percent,
            volume: rng.gen_range(1_000_000..50_000_000),
        })
    }

    async fn options_snapshot(&self, symbol: &str) -> Result<OptionsSnapshot> {
        let base = self.base_price(symbol)?;
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        let spot = base.to_f64().unwrap_or(0.0);
        let mut snapshot = OptionsSnapshot::default();
        let side = i64::from(self.strikes_per_side);

        for i in -side..=side {
            let strike = base + self.strike_spacing * Decimal::from(i);
            let strike_f = strike.to_f64().unwrap_or(spot);

            // Activity and gamma both decay away from the money.
            let moneyness = ((strike_f - spot) / spot).abs();
            let atm_factor = (1.0 - moneyness * 20.0).max(0.1);

            let call_volume = (rng.gen_range(50.0..500.0) * atm_factor) as u64;
            let put_volume = (rng.gen_range(50.0..500.0) * atm_factor) as u64;
            let call_oi = (rng.gen_range(500.0..5000.0) * atm_factor) as u64;
            let put_oi = (rng.gen_range(500.0..5000.0) * atm_factor) as u64;

            snapshot.strikes.insert(
                strike,
                StrikeData {
                    call_volume,
                    put_volume,
                    call_open_interest: call_oi,
                    put_open_interest: put_oi,
                    call_gamma: 0.005 * atm_factor,
                    put_gamma: 0.004 * atm_factor,
                },
            );
        }

        Ok(snapshot)
    }
}
