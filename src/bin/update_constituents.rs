// src/bin/update_constituents.rs
//
// One-shot bulk constituent update:
//   cargo run --bin update_constituents -- [INDEX_CODE ...]
// With no arguments, updates every built-in index.

use std::env;
use std::sync::Arc;

use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use findata_backend::scrapers::wikipedia::WikipediaIndexScraper;
use findata_backend::scrapers::IndexSourceConfig;
use findata_backend::services::index_registry::IndexRegistry;
use findata_backend::services::index_updater::IndexUpdater;
use findata_backend::services::membership::MembershipStore;

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

    let mut index_codes: Vec<String> = env::args().skip(1).collect();
    if index_codes.is_empty() {
        index_codes = IndexSourceConfig::builtin_codes()
            .iter()
            .map(|code| code.to_string())
            .collect();
    }

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = Database::connect(&database_url).await?;
    migration::Migrator::up(&db, None).await?;

    let registry = IndexRegistry::new(db.clone());
    let membership = MembershipStore::new(db.clone(), registry.clone());
    let updater = IndexUpdater::new(
        Arc::new(WikipediaIndexScraper::new()),
        registry,
        membership,
    );

    let results = updater.update_all(&index_codes).await;

    let mut failed = 0usize;
    println!("Update results:");
    for (code, outcome) in &results {
        match outcome {
            Ok(report) => println!(
                "  {}: {} constituents (+{} -{} ={})",
                code,
                report.total_constituents,
                report.summary.added_count,
                report.summary.removed_count,
                report.summary.unchanged_count
            ),
            Err(e) => {
                failed += 1;
                println!("  {}: FAILED - {}", code, e);
            }
        }
    }

    if failed > 0 {
        println!("{}/{} indices failed", failed, results.len());
        std::process::exit(1);
    }

    Ok(())
}
