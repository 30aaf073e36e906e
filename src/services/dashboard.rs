//! Dashboard aggregation with short-lived caching.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect};
use serde::Serialize;

use crate::entities::{prelude::*, risk_factors, timeseries_data};
use crate::error::StoreError;

#[derive(Debug, Clone, Serialize)]
pub struct OverviewStats {
    pub total_symbols: u64,
    pub total_data_points: u64,
    pub asset_classes: u64,
    pub total_indices: u64,
    pub earliest_date: Option<chrono::NaiveDate>,
    pub latest_date: Option<chrono::NaiveDate>,
    pub last_updated: Option<chrono::NaiveDateTime>,
}

#[derive(Clone)]
pub struct DashboardService {
    db: DatabaseConnection,
    cache: Arc<Cache<&'static str, OverviewStats>>,
}

impl DashboardService {
    pub fn new(db: DatabaseConnection) -> Self {
        let cache = Cache::builder()
            .max_capacity(8)
            .time_to_live(Duration::from_secs(300)) // 5 minute TTL
            .build();

        Self {
            db,
            cache: Arc::new(cache),
        }
    }

    pub async fn overview(&self) -> Result<OverviewStats, StoreError> {
        if let Some(stats) = self.cache.get("overview").await {
            tracing::debug!("Cache hit for overview stats");
            return Ok(stats);
        }

        tracing::info!("Computing overview statistics");

        let total_symbols = RiskFactors::find()
            .count(&self.db)
            .await
            .map_err(StoreError::db("dashboard", "count risk factors"))?;

        let total_data_points = TimeseriesData::find()
            .count(&self.db)
            .await
            .map_err(StoreError::db("dashboard", "count data points"))?;

        let asset_classes = RiskFactors::find()
            .select_only()
            .column(risk_factors::Column::AssetClass)
            .distinct()
            .into_tuple::<String>()
            .all(&self.db)
            .await
            .map_err(StoreError::db("dashboard", "count asset classes"))?
            .len() as u64;

        let total_indices = Indices::find()
            .count(&self.db)
            .await
            .map_err(StoreError::db("dashboard", "count indices"))?;

        let earliest_date = TimeseriesData::find()
            .order_by_asc(timeseries_data::Column::Date)
            .one(&self.db)
            .await
            .map_err(StoreError::db("dashboard", "earliest bar"))?
            .map(|bar| bar.date);

        let latest_date = TimeseriesData::find()
            .order_by_desc(timeseries_data::Column::Date)
            .one(&self.db)
            .await
            .map_err(StoreError::db("dashboard", "latest bar"))?
            .map(|bar| bar.date);

        let last_updated = RiskFactors::find()
            .order_by_desc(risk_factors::Column::LastUpdated)
            .one(&self.db)
            .await
            .map_err(StoreError::db("dashboard", "latest refresh"))?
            .and_then(|factor| factor.last_updated);

        let stats = OverviewStats {
            total_symbols,
            total_data_points,
            asset_classes,
            total_indices,
            earliest_date,
            latest_date,
            last_updated,
        };

        self.cache.insert("overview", stats.clone()).await;
        Ok(stats)
    }
}
