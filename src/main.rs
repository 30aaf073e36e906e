use std::env;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use findata_backend::jobs::constituents_sync::start_constituents_sync_job;
use findata_backend::scrapers::wikipedia::WikipediaIndexScraper;
use findata_backend::scrapers::IndexSourceConfig;
use findata_backend::services::dashboard::DashboardService;
use findata_backend::services::index_registry::IndexRegistry;
use findata_backend::services::index_updater::IndexUpdater;
use findata_backend::services::membership::MembershipStore;
use findata_backend::services::timeseries::TimeseriesStore;
use findata_backend::{handlers, AppState};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,findata_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Connect to database
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    // Wire services: one connection pool, passed down explicitly
    let registry = IndexRegistry::new(db.clone());
    let membership = MembershipStore::new(db.clone(), registry.clone());
    let scraper = Arc::new(WikipediaIndexScraper::new());
    let updater = IndexUpdater::new(scraper, registry.clone(), membership.clone());
    let timeseries = TimeseriesStore::new(db.clone());
    let dashboard = DashboardService::new(db.clone());

    // Which indices the background sync keeps fresh
    let index_codes: Vec<String> = env::var("FINDATA_INDICES")
        .map(|raw| {
            raw.split(',')
                .map(|code| code.trim().to_string())
                .filter(|code| !code.is_empty())
                .collect()
        })
        .unwrap_or_else(|_| {
            IndexSourceConfig::builtin_codes()
                .iter()
                .map(|code| code.to_string())
                .collect()
        });

    tracing::info!("Tracking indices: {}", index_codes.join(", "));
    start_constituents_sync_job(db.clone(), updater.clone(), index_codes).await;

    let state = AppState {
        db,
        registry,
        membership,
        updater,
        timeseries,
        dashboard,
    };

    // Build router
    let app = Router::new()
        .route("/", get(health))
        .route("/api/indices", get(handlers::indices::list_indices))
        .route(
            "/api/indices/{code}/constituents",
            get(handlers::indices::get_current_constituents),
        )
        .route(
            "/api/indices/{code}/constituents/historical",
            get(handlers::indices::get_historical_constituents),
        )
        .route(
            "/api/indices/{code}/membership",
            get(handlers::indices::check_membership),
        )
        .route(
            "/api/indices/{code}/changes",
            get(handlers::indices::get_changes),
        )
        .route(
            "/api/indices/{code}/update",
            post(handlers::indices::trigger_update),
        )
        .route(
            "/api/dashboard/overview",
            get(handlers::quality::get_overview),
        )
        .route(
            "/api/quality/{symbol}",
            get(handlers::quality::get_symbol_quality),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .unwrap();

    tracing::info!("Server listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

async fn health() -> &'static str {
    "findata-backend is up"
}
