pub mod wikipedia;

use async_trait::async_trait;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Source label recorded when a config doesn't specify one.
pub const DEFAULT_DATA_SOURCE: &str = "wikipedia";

lazy_static! {
    // Wikipedia cells carry footnote markers like "[1]" or "[note 2]"
    static ref FOOTNOTE_REGEX: Regex = Regex::new(r"\[[^\]]*\]").unwrap();
    static ref SYMBOL_REGEX: Regex = Regex::new(r"^[A-Z0-9][A-Z0-9.\-]{0,9}$").unwrap();
}

/// One normalized row of a constituents snapshot.
///
/// `symbol` is guaranteed trimmed and uppercased; everything else is
/// best-effort descriptive data carried through to the membership store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstituentRow {
    pub symbol: String,
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub sub_industry: Option<String>,
    pub date_added_to_index: Option<NaiveDate>,
    pub source: String,
}

/// Canonical fields a source table column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotField {
    Symbol,
    CompanyName,
    Sector,
    SubIndustry,
    DateAdded,
}

/// Extraction config for one index: where the page lives, which table holds
/// the constituents and how its headers map to canonical fields. Also
/// carries the registry metadata for the index itself.
#[derive(Debug, Clone)]
pub struct IndexSourceConfig {
    pub index_code: String,
    pub index_name: String,
    pub description: String,
    pub country: String,
    pub asset_class: String,
    pub data_source: String,
    pub url: String,
    pub table_index: usize,
    pub columns: Vec<(String, SnapshotField)>,
}

impl IndexSourceConfig {
    /// Look up the built-in config for an index code (case-insensitive).
    pub fn for_code(code: &str) -> Option<IndexSourceConfig> {
        match code.trim().to_uppercase().as_str() {
            "SP500" => Some(IndexSourceConfig {
                index_code: "SP500".to_string(),
                index_name: "S&P 500".to_string(),
                description: "Standard & Poor's 500 large-cap US equities".to_string(),
                country: "US".to_string(),
                asset_class: "equity".to_string(),
                data_source: DEFAULT_DATA_SOURCE.to_string(),
                url: "https://en.wikipedia.org/wiki/List_of_S%26P_500_companies".to_string(),
                table_index: 0,
                columns: vec![
                    ("Symbol".to_string(), SnapshotField::Symbol),
                    ("Security".to_string(), SnapshotField::CompanyName),
                    ("GICS Sector".to_string(), SnapshotField::Sector),
                    ("GICS Sub-Industry".to_string(), SnapshotField::SubIndustry),
                    ("Date added".to_string(), SnapshotField::DateAdded),
                ],
            }),
            "DOW30" => Some(IndexSourceConfig {
                index_code: "DOW30".to_string(),
                index_name: "Dow Jones Industrial Average".to_string(),
                description: "Dow Jones 30 blue-chip US equities".to_string(),
                country: "US".to_string(),
                asset_class: "equity".to_string(),
                data_source: DEFAULT_DATA_SOURCE.to_string(),
                url: "https://en.wikipedia.org/wiki/Dow_Jones_Industrial_Average".to_string(),
                table_index: 1,
                columns: vec![
                    ("Symbol".to_string(), SnapshotField::Symbol),
                    ("Company".to_string(), SnapshotField::CompanyName),
                    ("Industry".to_string(), SnapshotField::Sector),
                    ("Date added".to_string(), SnapshotField::DateAdded),
                ],
            }),
            "NASDAQ100" => Some(IndexSourceConfig {
                index_code: "NASDAQ100".to_string(),
                index_name: "Nasdaq-100".to_string(),
                description: "100 largest non-financial Nasdaq equities".to_string(),
                country: "US".to_string(),
                asset_class: "equity".to_string(),
                data_source: DEFAULT_DATA_SOURCE.to_string(),
                url: "https://en.wikipedia.org/wiki/Nasdaq-100".to_string(),
                table_index: 3,
                columns: vec![
                    ("Ticker".to_string(), SnapshotField::Symbol),
                    ("Symbol".to_string(), SnapshotField::Symbol),
                    ("Company".to_string(), SnapshotField::CompanyName),
                    ("GICS Sector".to_string(), SnapshotField::Sector),
                    ("GICS Sub-Industry".to_string(), SnapshotField::SubIndustry),
                ],
            }),
            _ => None,
        }
    }

    pub fn builtin_codes() -> &'static [&'static str] {
        &["SP500", "DOW30", "NASDAQ100"]
    }
}

/// Producer of constituent snapshots. The orchestrator only depends on this
/// trait, so tests can substitute a scripted source.
#[async_trait]
pub trait ConstituentSource: Send + Sync {
    async fn fetch_constituents(
        &self,
        config: &IndexSourceConfig,
    ) -> Result<Vec<ConstituentRow>, FetchError>;
}

/// Strip footnote markers and collapse whitespace in a scraped cell.
pub fn clean_cell(raw: &str) -> String {
    let without_notes = FOOTNOTE_REGEX.replace_all(raw, "");
    without_notes.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical symbol normalization: trimmed, uppercased, plausible ticker.
/// Returns None for empty or junk cells so callers can drop the row.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let cleaned = clean_cell(raw).to_uppercase();
    if SYMBOL_REGEX.is_match(&cleaned) {
        Some(cleaned)
    } else {
        None
    }
}

pub(crate) fn non_empty(cleaned: String) -> Option<String> {
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// Lenient date parsing for "Date added" style cells. Sources mix ISO dates
/// with long-form dates; anything else becomes None rather than an error.
pub fn parse_source_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = clean_cell(raw);
    if cleaned.is_empty() {
        return None;
    }
    if let Some(prefix) = cleaned.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }
    NaiveDate::parse_from_str(&cleaned, "%B %d, %Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_cell_strips_footnotes() {
        assert_eq!(clean_cell("Apple Inc.[1]"), "Apple Inc.");
        assert_eq!(clean_cell("  3M \n Company [note 2] "), "3M Company");
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol(" aapl "), Some("AAPL".to_string()));
        assert_eq!(normalize_symbol("BRK.B[2]"), Some("BRK.B".to_string()));
        assert_eq!(normalize_symbol(""), None);
        assert_eq!(normalize_symbol("—"), None);
        assert_eq!(normalize_symbol("not a ticker"), None);
    }

    #[test]
    fn test_parse_source_date_formats() {
        assert_eq!(
            parse_source_date("1957-03-04"),
            NaiveDate::from_ymd_opt(1957, 3, 4)
        );
        assert_eq!(
            parse_source_date("March 4, 1957[3]"),
            NaiveDate::from_ymd_opt(1957, 3, 4)
        );
        assert_eq!(parse_source_date("1957-03-04 (as ABC)"), NaiveDate::from_ymd_opt(1957, 3, 4));
        assert_eq!(parse_source_date("unknown"), None);
        assert_eq!(parse_source_date(""), None);
    }

    #[test]
    fn test_builtin_configs_resolve() {
        for code in IndexSourceConfig::builtin_codes() {
            let config = IndexSourceConfig::for_code(code).expect("builtin config");
            assert_eq!(config.index_code, *code);
            assert!(config
                .columns
                .iter()
                .any(|(_, field)| *field == SnapshotField::Symbol));
        }
        assert!(IndexSourceConfig::for_code("sp500").is_some());
        assert!(IndexSourceConfig::for_code("NOPE").is_none());
    }
}
