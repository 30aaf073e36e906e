//! Daily-bar download from a Yahoo-Finance-style chart endpoint.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde::Deserialize;

use crate::error::FetchError;
use crate::services::timeseries::DailyBar;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Producer of daily OHLCV bars. The bulk loader only depends on this trait.
#[async_trait]
pub trait BarSource: Send + Sync {
    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, FetchError>;
}

#[derive(Clone)]
pub struct MarketDataService {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartPayload,
}

#[derive(Debug, Deserialize)]
struct ChartPayload {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteBlock>,
    adjclose: Option<Vec<AdjCloseBlock>>,
}

#[derive(Debug, Deserialize, Default)]
struct QuoteBlock {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseBlock {
    adjclose: Option<Vec<Option<f64>>>,
}

impl MarketDataService {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .unwrap();

        Self { client, base_url }
    }
}

impl Default for MarketDataService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BarSource for MarketDataService {
    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, FetchError> {
        tracing::info!("Fetching daily bars for {} ({} to {})", symbol, start, end);

        let url = format!("{}/{}", self.base_url, symbol);
        let period1 = start.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp()).unwrap_or(0);
        // period2 is exclusive upstream, push it past the end date
        let period2 = (end + chrono::Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| FetchError::Http {
                url: url.clone(),
                source,
            })?;

        let payload: ChartResponse = response.json().await.map_err(|source| FetchError::Http {
            url: url.clone(),
            source,
        })?;

        if let Some(error) = payload.chart.error {
            if !error.is_null() {
                return Err(FetchError::Parse {
                    context: symbol.to_string(),
                    message: format!("chart API error: {}", error),
                });
            }
        }

        let result = payload
            .chart
            .result
            .and_then(|mut results| if results.is_empty() { None } else { Some(results.remove(0)) })
            .ok_or_else(|| FetchError::Parse {
                context: symbol.to_string(),
                message: "chart API returned no result".to_string(),
            })?;

        let timestamps = result.timestamp.unwrap_or_default();
        let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
        let adjclose = result
            .indicators
            .adjclose
            .and_then(|mut blocks| if blocks.is_empty() { None } else { blocks.remove(0).adjclose });

        let series = |values: &Option<Vec<Option<f64>>>, i: usize| -> Option<f64> {
            values.as_ref().and_then(|v| v.get(i).copied().flatten())
        };

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, ts) in timestamps.iter().enumerate() {
            // Rows without a close are upstream holes, not bars
            let Some(close) = series(&quote.close, i) else {
                continue;
            };
            let Some(date) = DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive()) else {
                continue;
            };

            bars.push(DailyBar {
                date,
                open: series(&quote.open, i),
                high: series(&quote.high, i),
                low: series(&quote.low, i),
                close,
                adj_close: adjclose.as_ref().and_then(|v| v.get(i).copied().flatten()),
                volume: series(&quote.volume, i),
            });
        }

        tracing::debug!("Fetched {} bars for {}", bars.len(), symbol);
        Ok(bars)
    }
}
