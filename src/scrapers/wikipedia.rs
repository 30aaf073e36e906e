use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};

use super::{
    clean_cell, non_empty, normalize_symbol, parse_source_date, ConstituentRow, ConstituentSource,
    IndexSourceConfig, SnapshotField,
};
use crate::error::FetchError;

// Wikipedia rejects anonymous clients with 403
const USER_AGENT: &str = "findata-backend/0.1.0 (financial data research; contact: ops@findata.dev)";

/// Scrapes current index constituents from Wikipedia list pages.
///
/// Fetching is a single bounded request; there is no retry here. Callers that
/// want retries (the bulk loader does, the update orchestrator does not) add
/// their own policy.
#[derive(Clone)]
pub struct WikipediaIndexScraper {
    client: Client,
}

impl WikipediaIndexScraper {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .unwrap();

        Self { client }
    }

    async fn fetch_page(&self, config: &IndexSourceConfig) -> Result<String, FetchError> {
        tracing::info!(
            "Fetching {} constituents from {}",
            config.index_code,
            config.url
        );

        let response = self
            .client
            .get(&config.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| FetchError::Http {
                url: config.url.clone(),
                source,
            })?;

        response.text().await.map_err(|source| FetchError::Http {
            url: config.url.clone(),
            source,
        })
    }
}

impl Default for WikipediaIndexScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConstituentSource for WikipediaIndexScraper {
    async fn fetch_constituents(
        &self,
        config: &IndexSourceConfig,
    ) -> Result<Vec<ConstituentRow>, FetchError> {
        let html = self.fetch_page(config).await?;
        parse_constituents(&html, config)
    }
}

fn selector(css: &str, index_code: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::Parse {
        context: index_code.to_string(),
        message: format!("bad selector {}: {}", css, e),
    })
}

/// Extract constituent rows from a fetched page according to the config's
/// table index and column mapping. Split out from the HTTP path so it can be
/// tested against static HTML.
pub fn parse_constituents(
    html: &str,
    config: &IndexSourceConfig,
) -> Result<Vec<ConstituentRow>, FetchError> {
    let code = config.index_code.as_str();
    let document = Html::parse_document(html);

    let table_sel = selector("table.wikitable", code)?;
    let row_sel = selector("tr", code)?;
    let cell_sel = selector("th, td", code)?;

    let tables: Vec<_> = document.select(&table_sel).collect();
    tracing::debug!("Found {} wikitable tables on {} page", tables.len(), code);

    let table = tables.get(config.table_index).ok_or_else(|| FetchError::Parse {
        context: code.to_string(),
        message: format!(
            "table index {} out of range, found {} tables",
            config.table_index,
            tables.len()
        ),
    })?;

    let mut rows = table.select(&row_sel);

    let header_row = rows.next().ok_or_else(|| FetchError::Parse {
        context: code.to_string(),
        message: "constituents table has no rows".to_string(),
    })?;

    let headers: Vec<String> = header_row
        .select(&cell_sel)
        .map(|cell| clean_cell(&cell.text().collect::<String>()))
        .collect();

    // Map table column positions to canonical snapshot fields
    let mut field_positions: Vec<(usize, SnapshotField)> = Vec::new();
    for (position, header) in headers.iter().enumerate() {
        if let Some((_, field)) = config
            .columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(header))
        {
            field_positions.push((position, *field));
        }
    }

    if !field_positions
        .iter()
        .any(|(_, field)| *field == SnapshotField::Symbol)
    {
        return Err(FetchError::Parse {
            context: code.to_string(),
            message: format!("no symbol column found, headers: {:?}", headers),
        });
    }

    let mut constituents = Vec::new();
    let mut dropped = 0usize;

    for row in rows {
        let cells: Vec<String> = row
            .select(&cell_sel)
            .map(|cell| clean_cell(&cell.text().collect::<String>()))
            .collect();

        if cells.is_empty() {
            continue;
        }

        let mut symbol = None;
        let mut company_name = None;
        let mut sector = None;
        let mut sub_industry = None;
        let mut date_added = None;

        for (position, field) in &field_positions {
            let Some(raw) = cells.get(*position) else {
                continue;
            };
            match field {
                SnapshotField::Symbol => symbol = normalize_symbol(raw),
                SnapshotField::CompanyName => company_name = non_empty(raw.clone()),
                SnapshotField::Sector => sector = non_empty(raw.clone()),
                SnapshotField::SubIndustry => sub_industry = non_empty(raw.clone()),
                SnapshotField::DateAdded => date_added = parse_source_date(raw),
            }
        }

        match symbol {
            Some(symbol) => constituents.push(ConstituentRow {
                symbol,
                company_name,
                sector,
                sub_industry,
                date_added_to_index: date_added,
                source: config.data_source.clone(),
            }),
            None => {
                dropped += 1;
                tracing::warn!(
                    "Dropping {} row without a usable symbol: {:?}",
                    code,
                    cells.first()
                );
            }
        }
    }

    if constituents.is_empty() {
        return Err(FetchError::EmptySnapshot {
            index_code: code.to_string(),
        });
    }

    if dropped > 0 {
        tracing::warn!(
            "Dropped {}/{} rows for {} during extraction",
            dropped,
            dropped + constituents.len(),
            code
        );
    }

    tracing::info!("Extracted {} constituents for {}", constituents.len(), code);
    Ok(constituents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sp500_like_config() -> IndexSourceConfig {
        IndexSourceConfig::for_code("SP500").unwrap()
    }

    const SAMPLE_HTML: &str = r#"
        <html><body>
        <table class="wikitable">
          <tr>
            <th>Symbol</th><th>Security</th><th>GICS Sector</th>
            <th>GICS Sub-Industry</th><th>Date added</th>
          </tr>
          <tr>
            <td>aapl</td><td>Apple Inc.[1]</td><td>Information Technology</td>
            <td>Technology Hardware</td><td>1982-11-30</td>
          </tr>
          <tr>
            <td>MSFT</td><td>Microsoft</td><td>Information Technology</td>
            <td>Systems Software</td><td>June 1, 1994</td>
          </tr>
          <tr>
            <td></td><td>Ghost Corp</td><td>Unknown</td><td></td><td></td>
          </tr>
        </table>
        </body></html>
    "#;

    #[test]
    fn test_parse_constituents_maps_and_normalizes() {
        let rows = parse_constituents(SAMPLE_HTML, &sp500_like_config()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol, "AAPL");
        assert_eq!(rows[0].company_name.as_deref(), Some("Apple Inc."));
        assert_eq!(
            rows[0].date_added_to_index,
            NaiveDate::from_ymd_opt(1982, 11, 30)
        );
        assert_eq!(rows[1].symbol, "MSFT");
        assert_eq!(
            rows[1].date_added_to_index,
            NaiveDate::from_ymd_opt(1994, 6, 1)
        );
        assert_eq!(rows[0].source, "wikipedia");
    }

    #[test]
    fn test_parse_constituents_table_out_of_range() {
        let mut config = sp500_like_config();
        config.table_index = 5;

        let err = parse_constituents(SAMPLE_HTML, &config).unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
    }

    #[test]
    fn test_parse_constituents_rejects_symbolless_table() {
        let html = r#"
            <table class="wikitable">
              <tr><th>Security</th></tr>
              <tr><td>Apple Inc.</td></tr>
            </table>
        "#;

        let err = parse_constituents(html, &sp500_like_config()).unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
    }

    #[test]
    fn test_parse_constituents_all_rows_invalid() {
        let html = r#"
            <table class="wikitable">
              <tr><th>Symbol</th><th>Security</th></tr>
              <tr><td></td><td>Ghost Corp</td></tr>
            </table>
        "#;

        let err = parse_constituents(html, &sp500_like_config()).unwrap_err();
        assert!(matches!(err, FetchError::EmptySnapshot { .. }));
    }
}
