//! Seams between the engine and its external collaborators.
//!
//! The market data adapter, the touch-history store, and the market
//! calendar are injected so the engine stays testable and the fragile
//! calendar heuristics can be corrected without touching scoring logic.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Local, Timelike, Utc};

use crate::types::{OptionsSnapshot, Quote, TouchRecord};

/// Supplies current quotes and per-strike options snapshots.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetches the current quote for an instrument.
    async fn quote(&self, symbol: &str) -> Result<Quote>;

    /// Fetches the per-strike options snapshot for an instrument.
    async fn options_snapshot(&self, symbol: &str) -> Result<OptionsSnapshot>;
}

/// Durable key-value store for touch history.
///
/// Keys are `"{instrument}_{strike}"`. Implementations must support a bulk
/// load at startup and per-key writes; `flush` makes writes durable.
#[async_trait]
pub trait TouchStore: Send + Sync {
    /// Loads every persisted entry.
    async fn load_all(&self) -> Result<HashMap<String, TouchRecord>>;

    /// Stages one entry for persistence.
    async fn put(&self, key: &str, record: &TouchRecord) -> Result<()>;

    /// Makes staged writes durable.
    async fn flush(&self) -> Result<()>;
}

/// Clock and calendar facts the timing adjustments depend on.
///
/// The OPEX day-of-month window and the "power hour" check are known-fragile
/// wall-clock heuristics; keeping them behind this trait lets tests pin a
/// date and lets the rules be corrected in one place.
pub trait MarketCalendar: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Day of month (1-31) in the exchange's local time.
    fn day_of_month(&self) -> u32;

    /// Hour of day (0-23) in the exchange's local time.
    fn local_hour(&self) -> u32;
}

/// Calendar backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCalendar;

impl MarketCalendar for SystemCalendar {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn day_of_month(&self) -> u32 {
        Local::now().day()
    }

    fn local_hour(&self) -> u32 {
        Local::now().hour()
    }
}
