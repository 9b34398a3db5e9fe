use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::info;

use heatseeker_core::{ConfigLoader, EngineConfig, SystemCalendar};
use heatseeker_data::{JsonTouchStore, SimulatedDataProvider};
use heatseeker_engine::HeatseekerEngine;

#[derive(Parser)]
#[command(name = "heatseeker")]
#[command(about = "Dealer positioning analysis engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single scan and print the signal reports
    Scan {
        /// Config file path
        #[arg(short, long, default_value = "config/Heatseeker.toml")]
        config: String,
    },
    /// Run the periodic scan loop
    Run {
        /// Config file path
        #[arg(short, long, default_value = "config/Heatseeker.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { config } => {
            let config = ConfigLoader::load_from(&config)?;
            let mut engine = build_engine(config).await;
            let analyses = engine.scan().await;
            for a in &analyses {
                if let Some(report) = engine.trading_signals(&a.underlying_symbol) {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
            }
        }
        Commands::Run { config } => {
            let config = ConfigLoader::load_from(&config)?;
            let mut engine = build_engine(config).await;
            engine.run_loop().await?;
        }
    }

    Ok(())
}

/// Wires the engine to the simulated provider and the file-backed touch
/// store. A real options feed plugs in here once one exists; the engine
/// only sees the `MarketDataProvider` trait.
async fn build_engine(config: EngineConfig) -> HeatseekerEngine {
    info!(symbols = ?config.symbols, store = config.touch_store_path, "Starting engine");

    let mut prices: HashMap<String, Decimal> = HashMap::new();
    for symbol in &config.symbols {
        // simulated spot per symbol; replace with a live adapter for real data
        prices.insert(symbol.clone(), Decimal::from(500));
    }

    let provider = Arc::new(SimulatedDataProvider::new(prices));
    let store = Arc::new(JsonTouchStore::new(&config.touch_store_path));
    HeatseekerEngine::new(config, provider, store, Arc::new(SystemCalendar)).await
}
