//! Bulk OHLCV store.
//!
//! A deliberately narrow interface: resolve-or-register an instrument,
//! append daily bars with upsert semantics, refresh the instrument's date
//! range metadata, read bars back. The membership subsystem never touches
//! these tables directly.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::{prelude::*, risk_factors, timeseries_data};
use crate::error::StoreError;

/// Descriptive metadata for registering an instrument.
#[derive(Debug, Clone)]
pub struct RiskFactorMeta {
    pub symbol: String,
    pub asset_class: String,
    pub asset_subclass: Option<String>,
    pub description: Option<String>,
    pub currency: Option<String>,
    pub country: Option<String>,
    pub sector: Option<String>,
    pub data_source: String,
}

/// One daily OHLCV bar as produced by a market-data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub adj_close: Option<f64>,
    pub volume: Option<f64>,
}

#[derive(Clone)]
pub struct TimeseriesStore {
    db: DatabaseConnection,
}

impl TimeseriesStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn risk_factor(
        &self,
        symbol: &str,
        asset_class: &str,
        data_source: &str,
    ) -> Result<Option<risk_factors::Model>, StoreError> {
        RiskFactors::find()
            .filter(risk_factors::Column::Symbol.eq(symbol))
            .filter(risk_factors::Column::AssetClass.eq(asset_class))
            .filter(risk_factors::Column::DataSource.eq(data_source))
            .one(&self.db)
            .await
            .map_err(StoreError::db(symbol, "risk_factor lookup"))
    }

    /// Resolve the instrument's id, registering it if unknown.
    pub async fn ensure_risk_factor(&self, meta: &RiskFactorMeta) -> Result<i32, StoreError> {
        if let Some(existing) = self
            .risk_factor(&meta.symbol, &meta.asset_class, &meta.data_source)
            .await?
        {
            return Ok(existing.id);
        }

        let new_factor = risk_factors::ActiveModel {
            symbol: Set(meta.symbol.clone()),
            asset_class: Set(meta.asset_class.clone()),
            asset_subclass: Set(meta.asset_subclass.clone()),
            description: Set(meta.description.clone()),
            currency: Set(meta.currency.clone()),
            country: Set(meta.country.clone()),
            sector: Set(meta.sector.clone()),
            data_source: Set(meta.data_source.clone()),
            frequency: Set("daily".to_string()),
            is_active: Set(true),
            created_at: Set(Some(Utc::now().naive_utc())),
            ..Default::default()
        };

        let inserted = new_factor
            .insert(&self.db)
            .await
            .map_err(StoreError::db(&meta.symbol, "register risk factor"))?;

        tracing::info!(
            "Registered risk factor {} ({}/{}) id={}",
            meta.symbol,
            meta.asset_class,
            meta.data_source,
            inserted.id
        );
        Ok(inserted.id)
    }

    /// Append bars for an instrument. A bar that already exists for the date
    /// is overwritten, so retried loads are safe.
    pub async fn append_daily_bars(
        &self,
        risk_factor_id: i32,
        bars: &[DailyBar],
    ) -> Result<u64, StoreError> {
        if bars.is_empty() {
            return Ok(0);
        }

        let models: Vec<timeseries_data::ActiveModel> = bars
            .iter()
            .map(|bar| timeseries_data::ActiveModel {
                risk_factor_id: Set(risk_factor_id),
                date: Set(bar.date),
                open: Set(bar.open),
                high: Set(bar.high),
                low: Set(bar.low),
                close: Set(bar.close),
                adj_close: Set(bar.adj_close),
                volume: Set(bar.volume),
                data_quality: Set("good".to_string()),
                ..Default::default()
            })
            .collect();

        let count = models.len() as u64;

        TimeseriesData::insert_many(models)
            .on_conflict(
                OnConflict::columns([
                    timeseries_data::Column::RiskFactorId,
                    timeseries_data::Column::Date,
                ])
                .update_columns([
                    timeseries_data::Column::Open,
                    timeseries_data::Column::High,
                    timeseries_data::Column::Low,
                    timeseries_data::Column::Close,
                    timeseries_data::Column::AdjClose,
                    timeseries_data::Column::Volume,
                    timeseries_data::Column::DataQuality,
                ])
                .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(StoreError::db("timeseries", "append daily bars"))?;

        tracing::debug!(
            "Appended {} bars for risk factor {}",
            count,
            risk_factor_id
        );
        Ok(count)
    }

    /// Recompute the instrument's stored date range and bump `last_updated`.
    pub async fn refresh_metadata(&self, risk_factor_id: i32) -> Result<(), StoreError> {
        let first = TimeseriesData::find()
            .filter(timeseries_data::Column::RiskFactorId.eq(risk_factor_id))
            .order_by_asc(timeseries_data::Column::Date)
            .one(&self.db)
            .await
            .map_err(StoreError::db("timeseries", "refresh metadata"))?;
        let last = TimeseriesData::find()
            .filter(timeseries_data::Column::RiskFactorId.eq(risk_factor_id))
            .order_by_desc(timeseries_data::Column::Date)
            .one(&self.db)
            .await
            .map_err(StoreError::db("timeseries", "refresh metadata"))?;

        let factor = RiskFactors::find_by_id(risk_factor_id)
            .one(&self.db)
            .await
            .map_err(StoreError::db("timeseries", "refresh metadata"))?;

        let Some(factor) = factor else {
            return Ok(());
        };

        let mut active_model = factor.into_active_model();
        active_model.start_date = Set(first.map(|bar| bar.date));
        active_model.end_date = Set(last.map(|bar| bar.date));
        active_model.last_updated = Set(Some(Utc::now().naive_utc()));
        active_model
            .update(&self.db)
            .await
            .map_err(StoreError::db("timeseries", "refresh metadata"))?;

        Ok(())
    }

    /// Stored bars for a symbol, oldest first. Unknown symbols yield an
    /// empty result rather than an error.
    pub async fn bars(
        &self,
        symbol: &str,
        asset_class: &str,
        data_source: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<timeseries_data::Model>, StoreError> {
        let Some(factor) = self.risk_factor(symbol, asset_class, data_source).await? else {
            return Ok(Vec::new());
        };

        let mut query = TimeseriesData::find()
            .filter(timeseries_data::Column::RiskFactorId.eq(factor.id));
        if let Some(start) = start {
            query = query.filter(timeseries_data::Column::Date.gte(start));
        }
        if let Some(end) = end {
            query = query.filter(timeseries_data::Column::Date.lte(end));
        }

        query
            .order_by_asc(timeseries_data::Column::Date)
            .all(&self.db)
            .await
            .map_err(StoreError::db(symbol, "query bars"))
    }
}
