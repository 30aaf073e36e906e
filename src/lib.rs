// src/lib.rs

use sea_orm::DatabaseConnection;
use services::{
    dashboard::DashboardService, index_registry::IndexRegistry, index_updater::IndexUpdater,
    membership::MembershipStore, timeseries::TimeseriesStore,
};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub registry: IndexRegistry,
    pub membership: MembershipStore,
    pub updater: IndexUpdater,
    pub timeseries: TimeseriesStore,
    pub dashboard: DashboardService,
}

pub mod entities {
    pub mod prelude;
    pub mod index_constituents;
    pub mod indices;
    pub mod risk_factors;
    pub mod sync_status;
    pub mod timeseries_data;
}

pub mod services {
    pub mod dashboard;
    pub mod equity_loader;
    pub mod index_registry;
    pub mod index_updater;
    pub mod market_data;
    pub mod membership;
    pub mod quality;
    pub mod sync_status;
    pub mod timeseries;
}

pub mod error;
pub mod handlers;
pub mod jobs;
pub mod models;
pub mod scrapers;
