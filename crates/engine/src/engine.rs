//! Scan orchestration.
//!
//! One `HeatseekerEngine` owns the scan loop for a correlated instrument
//! set. Each scan fetches market data for every instrument concurrently
//! under a timeout, scores and classifies serially, runs confluence across
//! whatever completed, then flushes touch history. An instrument that fails
//! to fetch is skipped for that scan; the engine always produces output for
//! the instruments it has data for.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::future::join_all;
use tracing::{error, info, warn};

use heatseeker_core::{
    EngineConfig, MarketCalendar, MarketDataProvider, OptionsSnapshot, PositioningAnalysis, Quote,
    SignalReport, TouchStore,
};

use crate::analysis::{analyze_instrument, ScanContext};
use crate::confluence::apply_confluence;
use crate::regime::{detect_regime, opex_adjustment, robinhood_effect};
use crate::signal::build_report;
use crate::touch::TouchTracker;

/// The dealer positioning analysis engine.
pub struct HeatseekerEngine {
    config: EngineConfig,
    provider: Arc<dyn MarketDataProvider>,
    calendar: Arc<dyn MarketCalendar>,
    tracker: TouchTracker,
    last_analyses: HashMap<String, PositioningAnalysis>,
}

impl HeatseekerEngine {
    /// Builds an engine, bulk-loading touch history from the store. An
    /// unreadable store degrades to an empty history with a warning.
    pub async fn new(
        config: EngineConfig,
        provider: Arc<dyn MarketDataProvider>,
        store: Arc<dyn TouchStore>,
        calendar: Arc<dyn MarketCalendar>,
    ) -> Self {
        let tracker = TouchTracker::load(store, config.touch_reset, calendar.now()).await;
        Self {
            config,
            provider,
            calendar,
            tracker,
            last_analyses: HashMap::new(),
        }
    }

    /// Runs one scan over the configured instrument set.
    ///
    /// Never fails as a whole: instruments whose fetch errors or times out
    /// are skipped with a warning, and confluence runs over whatever
    /// remains (two or more).
    pub async fn scan(&mut self) -> Vec<PositioningAnalysis> {
        let fetched = self.fetch_all().await;
        if fetched.is_empty() {
            warn!("No instrument data available this scan");
            return Vec::new();
        }

        let changes: Vec<f64> = fetched.iter().map(|(_, q, _)| q.change_percent).collect();
        let ctx = ScanContext {
            timestamp: self.calendar.now(),
            regime: detect_regime(&changes),
            opex_adjustment: opex_adjustment(self.calendar.as_ref()),
            robinhood_effect: robinhood_effect(self.calendar.as_ref()),
        };

        let mut analyses: Vec<PositioningAnalysis> = fetched
            .iter()
            .map(|(symbol, quote, snapshot)| {
                analyze_instrument(
                    symbol,
                    quote,
                    snapshot,
                    &mut self.tracker,
                    &ctx,
                    &self.config.thresholds,
                    self.last_analyses.get(symbol),
                )
            })
            .collect();

        apply_confluence(&mut analyses);

        for analysis in &analyses {
            self.last_analyses
                .insert(analysis.underlying_symbol.clone(), analysis.clone());
        }

        // Flush after every scan so a crash loses at most one scan's touches.
        if let Err(e) = self.tracker.flush().await {
            warn!(error = %e, "Failed to flush touch history");
        }

        analyses
    }

    /// Fetches quote and options snapshot per instrument, concurrently,
    /// each bounded by the configured timeout.
    async fn fetch_all(&self) -> Vec<(String, Quote, OptionsSnapshot)> {
        let timeout = Duration::from_secs(self.config.fetch_timeout_secs);
        let fetches = self.config.symbols.iter().map(|symbol| {
            let provider = Arc::clone(&self.provider);
            let symbol = symbol.clone();
            async move {
                let result = tokio::time::timeout(timeout, fetch_instrument(provider, &symbol))
                    .await
                    .context("market data fetch timed out")
                    .and_then(|r| r);
                (symbol, result)
            }
        });

        let mut fetched = Vec::new();
        for (symbol, result) in join_all(fetches).await {
            match result {
                Ok((quote, snapshot)) => fetched.push((symbol, quote, snapshot)),
                Err(e) => warn!(symbol, error = %e, "Skipping instrument this scan"),
            }
        }
        fetched
    }

    /// The signal-consumer contract: the ranked signal report for one
    /// instrument, from the most recent scan. `None` before the first
    /// successful scan of that instrument.
    #[must_use]
    pub fn trading_signals(&self, symbol: &str) -> Option<SignalReport> {
        self.last_analyses
            .get(symbol)
            .map(|a| build_report(a, &self.config.thresholds))
    }

    /// The most recent analysis for one instrument.
    #[must_use]
    pub fn last_analysis(&self, symbol: &str) -> Option<&PositioningAnalysis> {
        self.last_analyses.get(symbol)
    }

    /// Runs the periodic scan loop until the task is cancelled.
    ///
    /// # Errors
    /// Currently never returns; the `Result` keeps the signature stable for
    /// callers that `?` it.
    pub async fn run_loop(&mut self) -> Result<()> {
        info!(
            poll_secs = self.config.poll_interval_secs,
            symbols = ?self.config.symbols,
            "Heatseeker scan loop started"
        );
        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.poll_interval_secs));

        loop {
            interval.tick().await;
            let analyses = self.scan().await;
            if analyses.is_empty() {
                error!("Scan produced no analyses");
                continue;
            }
            for a in &analyses {
                let king = a.king_nodes.first().map(|n| n.strike.to_string());
                info!(
                    symbol = a.underlying_symbol,
                    price = %a.underlying_price,
                    regime = ?a.market_regime,
                    king = king.as_deref().unwrap_or("-"),
                    confluence = a.confluence_score,
                    confidence = a.overall_confidence,
                    "Scan complete"
                );
            }
        }
    }
}

async fn fetch_instrument(
    provider: Arc<dyn MarketDataProvider>,
    symbol: &str,
) -> Result<(Quote, OptionsSnapshot)> {
    let quote = provider
        .quote(symbol)
        .await
        .with_context(|| format!("quote fetch failed for {symbol}"))?;
    let snapshot = provider
        .options_snapshot(symbol)
        .await
        .with_context(|| format!("options snapshot fetch failed for {symbol}"))?;
    Ok((quote, snapshot))
}
