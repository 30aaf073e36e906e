//! Rate-limited bulk bar loader.
//!
//! Pacing is conservative on purpose: external market-data endpoints
//! throttle aggressively, so there is a fixed delay between symbols and a
//! longer pause after every batch. Per-symbol downloads retry with
//! exponential backoff; retry policy lives here and nowhere else.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::time::{sleep, Duration};

use crate::error::{FetchError, LoaderError};
use crate::services::market_data::BarSource;
use crate::services::timeseries::{DailyBar, RiskFactorMeta, TimeseriesStore};

/// What to load for one symbol.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub asset_subclass: String,
    pub description: Option<String>,
    pub country: String,
    pub currency: String,
    pub sector: Option<String>,
    pub skip_existing: bool,
}

impl LoadRequest {
    pub fn new(symbol: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            start,
            end,
            asset_subclass: "stock".to_string(),
            description: None,
            country: "US".to_string(),
            currency: "USD".to_string(),
            sector: None,
            skip_existing: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub symbol: String,
    pub records: u64,
    pub skipped: bool,
}

pub struct EquityLoader {
    source: Arc<dyn BarSource>,
    store: TimeseriesStore,
    delay: Duration,
    batch_size: usize,
    batch_pause: Duration,
    retry_max: u32,
    retry_base_delay: Duration,
}

impl EquityLoader {
    pub fn new(source: Arc<dyn BarSource>, store: TimeseriesStore) -> Self {
        Self {
            source,
            store,
            delay: Duration::from_secs(5),
            batch_size: 10,
            batch_pause: Duration::from_secs(30),
            retry_max: 3,
            retry_base_delay: Duration::from_secs(2),
        }
    }

    pub fn with_pacing(
        mut self,
        delay: Duration,
        batch_size: usize,
        batch_pause: Duration,
    ) -> Result<Self, LoaderError> {
        if batch_size == 0 {
            return Err(LoaderError::Config("batch_size must be positive".to_string()));
        }
        self.delay = delay;
        self.batch_size = batch_size;
        self.batch_pause = batch_pause;
        Ok(self)
    }

    pub fn with_retries(mut self, retry_max: u32, retry_base_delay: Duration) -> Self {
        self.retry_max = retry_max.max(1);
        self.retry_base_delay = retry_base_delay;
        self
    }

    async fn has_existing_data(&self, symbol: &str) -> bool {
        match self.store.risk_factor(symbol, "equity", "market_data").await {
            Ok(Some(factor)) => factor.start_date.is_some() && factor.end_date.is_some(),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("Error checking existing data for {}: {}", symbol, e);
                false
            }
        }
    }

    async fn download_with_retries(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, LoaderError> {
        let mut last_error: Option<FetchError> = None;

        for attempt in 0..self.retry_max {
            if attempt > 0 {
                let backoff = self.retry_base_delay * 2u32.pow(attempt - 1);
                tracing::info!(
                    "Retrying {} (attempt {}/{}) after {:?}",
                    symbol,
                    attempt + 1,
                    self.retry_max,
                    backoff
                );
                sleep(backoff).await;
            }

            match self.source.fetch_daily_bars(symbol, start, end).await {
                Ok(bars) => return Ok(bars),
                Err(e) => {
                    tracing::warn!("Download attempt {} for {} failed: {}", attempt + 1, symbol, e);
                    last_error = Some(e);
                }
            }
        }

        Err(LoaderError::Download {
            symbol: symbol.to_string(),
            attempts: self.retry_max,
            source: last_error.unwrap_or_else(|| FetchError::Parse {
                context: symbol.to_string(),
                message: "no download attempts were made".to_string(),
            }),
        })
    }

    /// Load one symbol: download (with retries), register the risk factor,
    /// upsert bars, refresh range metadata.
    pub async fn load_symbol(&self, request: &LoadRequest) -> Result<LoadSummary, LoaderError> {
        if request.symbol.trim().is_empty() {
            return Err(LoaderError::Config("symbol must be non-empty".to_string()));
        }
        if request.start > request.end {
            return Err(LoaderError::Config(format!(
                "start {} is after end {}",
                request.start, request.end
            )));
        }

        if request.skip_existing && self.has_existing_data(&request.symbol).await {
            tracing::info!("Skipping {} - data already exists", request.symbol);
            return Ok(LoadSummary {
                symbol: request.symbol.clone(),
                records: 0,
                skipped: true,
            });
        }

        tracing::info!("Loading {}...", request.symbol);

        let bars = self
            .download_with_retries(&request.symbol, request.start, request.end)
            .await?;

        if bars.is_empty() {
            tracing::warn!("No bars returned for {}", request.symbol);
            return Ok(LoadSummary {
                symbol: request.symbol.clone(),
                records: 0,
                skipped: false,
            });
        }

        let meta = RiskFactorMeta {
            symbol: request.symbol.clone(),
            asset_class: "equity".to_string(),
            asset_subclass: Some(request.asset_subclass.clone()),
            description: request.description.clone(),
            currency: Some(request.currency.clone()),
            country: Some(request.country.clone()),
            sector: request.sector.clone(),
            data_source: "market_data".to_string(),
        };

        let risk_factor_id = self.store.ensure_risk_factor(&meta).await?;
        let records = self.store.append_daily_bars(risk_factor_id, &bars).await?;
        self.store.refresh_metadata(risk_factor_id).await?;

        tracing::info!("Loaded {} records for {}", records, request.symbol);
        Ok(LoadSummary {
            symbol: request.symbol.clone(),
            records,
            skipped: false,
        })
    }

    /// Load a batch sequentially with pacing. One symbol's failure is
    /// captured per symbol and never aborts the rest of the batch.
    pub async fn load_symbols(
        &self,
        requests: &[LoadRequest],
    ) -> BTreeMap<String, Result<LoadSummary, LoaderError>> {
        let mut results = BTreeMap::new();

        for (i, request) in requests.iter().enumerate() {
            if i > 0 {
                sleep(self.delay).await;
                if i % self.batch_size == 0 {
                    tracing::info!(
                        "Rate limit: pausing {:?} after {} symbols",
                        self.batch_pause,
                        i
                    );
                    sleep(self.batch_pause).await;
                }
            }

            let outcome = self.load_symbol(request).await;
            if let Err(ref e) = outcome {
                tracing::error!("Failed to load {}: {}", request.symbol, e);
            }
            results.insert(request.symbol.clone(), outcome);
        }

        results
    }
}
