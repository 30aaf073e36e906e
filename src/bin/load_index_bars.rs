// src/bin/load_index_bars.rs
//
// One-shot OHLCV backfill for an index's current constituents:
//   cargo run --bin load_index_bars -- SP500 2020-01-01 2024-12-31

use std::env;
use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use findata_backend::services::equity_loader::{EquityLoader, LoadRequest};
use findata_backend::services::index_registry::IndexRegistry;
use findata_backend::services::market_data::MarketDataService;
use findata_backend::services::membership::MembershipStore;
use findata_backend::services::timeseries::TimeseriesStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <INDEX_CODE> <START> <END>", args[0]);
        std::process::exit(1);
    }

    let index_code = &args[1];
    let start = NaiveDate::parse_from_str(&args[2], "%Y-%m-%d")?;
    let end = NaiveDate::parse_from_str(&args[3], "%Y-%m-%d")?;

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = Database::connect(&database_url).await?;
    migration::Migrator::up(&db, None).await?;

    let registry = IndexRegistry::new(db.clone());
    let membership = MembershipStore::new(db.clone(), registry);
    let store = TimeseriesStore::new(db.clone());
    let loader = EquityLoader::new(Arc::new(MarketDataService::new()), store);

    let constituents = membership.current(index_code).await?;
    println!(
        "Loading bars for {} constituents of {}",
        constituents.len(),
        index_code
    );

    let requests: Vec<LoadRequest> = constituents
        .iter()
        .map(|constituent| {
            let mut request = LoadRequest::new(constituent.symbol.clone(), start, end);
            request.description = constituent.company_name.clone();
            request.sector = constituent.sector.clone();
            request
        })
        .collect();

    let results = loader.load_symbols(&requests).await;

    let mut loaded = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;
    for (symbol, outcome) in &results {
        match outcome {
            Ok(summary) if summary.skipped => skipped += 1,
            Ok(summary) => {
                loaded += 1;
                println!("  {}: {} records", symbol, summary.records);
            }
            Err(e) => {
                failed += 1;
                println!("  {}: FAILED - {}", symbol, e);
            }
        }
    }

    println!(
        "Done: {} loaded, {} skipped (existing data), {} failed",
        loaded, skipped, failed
    );

    Ok(())
}
