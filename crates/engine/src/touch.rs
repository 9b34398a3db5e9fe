//! Touch-sequence tracking.
//!
//! The tracker owns the in-memory touch map for the scan loop and fronts
//! the injected `TouchStore`. A touch is recorded when price comes within
//! the configured threshold of a strike; counts only ever increase and
//! sequence labels only advance. The map is flushed to the store after
//! every scan so a crash loses at most one scan's touches.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::warn;

use heatseeker_core::{TouchRecord, TouchResetPolicy, TouchSequence, TouchStore};

/// Store key for one (instrument, strike) pair. Strikes are normalized so
/// `500` and `500.00` map to the same entry.
#[must_use]
pub fn touch_key(symbol: &str, strike: Decimal) -> String {
    format!("{symbol}_{}", strike.normalize())
}

/// In-memory touch history over a durable store.
pub struct TouchTracker {
    store: Arc<dyn TouchStore>,
    records: HashMap<String, TouchRecord>,
}

impl TouchTracker {
    /// Loads history from the store. An unreadable store is a warning, not
    /// a failure: the tracker starts empty and every strike reads as
    /// untested. Under the `Daily` reset policy, entries last touched
    /// before today (UTC) are dropped.
    pub async fn load(
        store: Arc<dyn TouchStore>,
        policy: TouchResetPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        let mut records = match store.load_all().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Touch store unreadable, starting with empty history");
                HashMap::new()
            }
        };

        if policy == TouchResetPolicy::Daily {
            let today = now.date_naive();
            records.retain(|_, rec| rec.last_touch.date_naive() >= today);
        }

        Self { store, records }
    }

    /// Records a touch if `|price - strike| <= threshold_pct * price`.
    /// Returns true when a touch was recorded.
    pub fn update_touch(
        &mut self,
        symbol: &str,
        strike: Decimal,
        current_price: Decimal,
        threshold_pct: f64,
        now: DateTime<Utc>,
    ) -> bool {
        if current_price <= Decimal::ZERO {
            return false;
        }
        let threshold =
            current_price * Decimal::try_from(threshold_pct).unwrap_or(Decimal::ZERO);
        if (current_price - strike).abs() > threshold {
            return false;
        }

        self.records
            .entry(touch_key(symbol, strike))
            .and_modify(|rec| rec.record_touch(now))
            .or_insert_with(|| TouchRecord::first(now));
        true
    }

    /// Current sequence and count for a strike; `(Untested, 0)` when no
    /// entry exists.
    #[must_use]
    pub fn touch_info(&self, symbol: &str, strike: Decimal) -> (TouchSequence, u32) {
        self.records
            .get(&touch_key(symbol, strike))
            .map_or((TouchSequence::Untested, 0), |rec| (rec.sequence, rec.count))
    }

    /// Number of tracked entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when no touches have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Writes every entry through to the store and makes it durable.
    pub async fn flush(&self) -> anyhow::Result<()> {
        for (key, rec) in &self.records {
            self.store.put(key, rec).await?;
        }
        self.store.flush().await
    }
}
