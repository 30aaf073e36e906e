use chrono::NaiveDate;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use findata_backend::scrapers::ConstituentRow;
use findata_backend::services::index_registry::IndexRegistry;
use findata_backend::services::membership::MembershipStore;

/// Set up an isolated in-memory database with the full schema applied.
/// One connection only: a pooled in-memory SQLite would give every
/// connection its own empty database.
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1);

    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

#[allow(dead_code)]
pub async fn setup_membership() -> (DatabaseConnection, IndexRegistry, MembershipStore) {
    let db = setup_test_db().await.expect("in-memory database");
    let registry = IndexRegistry::new(db.clone());
    let membership = MembershipStore::new(db.clone(), registry.clone());
    (db, registry, membership)
}

#[allow(dead_code)]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

#[allow(dead_code)]
pub fn snapshot_row(symbol: &str) -> ConstituentRow {
    ConstituentRow {
        symbol: symbol.to_string(),
        company_name: Some(format!("{} Corp", symbol)),
        sector: Some("Information Technology".to_string()),
        sub_industry: None,
        date_added_to_index: None,
        source: "wikipedia".to_string(),
    }
}

#[allow(dead_code)]
pub fn snapshot(symbols: &[&str]) -> Vec<ConstituentRow> {
    symbols.iter().map(|symbol| snapshot_row(symbol)).collect()
}

#[allow(dead_code)]
pub async fn register_test_index(registry: &IndexRegistry, code: &str) -> i32 {
    registry
        .register_or_update(
            code,
            &format!("{} Test Index", code),
            "test fixture",
            "US",
            "wikipedia",
            "equity",
        )
        .await
        .expect("register test index")
}
