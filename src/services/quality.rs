//! Data-quality validation for stored OHLCV series.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::HashSet;

use crate::entities::timeseries_data;

#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Fewer stored bars than this is only a warning; short histories exist.
    pub min_data_points: usize,
    /// Fraction of missing business days tolerated before warning.
    pub max_missing_pct: f64,
    /// Absolute single-day return above this is flagged.
    pub max_single_day_return: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_data_points: 100,
            max_missing_pct: 0.1,
            max_single_day_return: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub symbol: String,
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub data_points: usize,
    pub missing_business_days: usize,
    pub missing_pct: f64,
}

fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Validate a stored series. Errors mean the data is unusable as-is
/// (bad prices, inconsistent bars); warnings flag gaps and anomalies worth a
/// look. Pure function so it can be tested without a database.
pub fn validate_bars(
    symbol: &str,
    bars: &[timeseries_data::Model],
    config: &ValidationConfig,
) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let data_points = bars.len();
    if data_points < config.min_data_points {
        warnings.push(format!(
            "Only {} data points (expected > {})",
            data_points, config.min_data_points
        ));
    }

    // Missing business days between the first and last stored bar
    let mut missing_business_days = 0usize;
    let mut missing_pct = 0.0;
    if let (Some(first), Some(last)) = (bars.first(), bars.last()) {
        let observed: HashSet<NaiveDate> = bars.iter().map(|bar| bar.date).collect();
        let mut expected = 0usize;
        let mut date = first.date;
        while date <= last.date {
            if is_business_day(date) {
                expected += 1;
                if !observed.contains(&date) {
                    missing_business_days += 1;
                }
            }
            date = date + chrono::Duration::days(1);
        }
        if expected > 0 {
            missing_pct = missing_business_days as f64 / expected as f64;
        }
        if missing_pct > config.max_missing_pct {
            warnings.push(format!(
                "{} missing business days ({:.1}% > {:.1}% threshold)",
                missing_business_days,
                missing_pct * 100.0,
                config.max_missing_pct * 100.0
            ));
        }
    }

    // Zero, negative or NaN closes make the series unusable
    let invalid_prices = bars
        .iter()
        .filter(|bar| bar.close <= 0.0 || bar.close.is_nan())
        .count();
    if invalid_prices > 0 {
        errors.push(format!(
            "Invalid prices (zero, negative, or NaN): {} occurrences",
            invalid_prices
        ));
    }

    // Extreme single-day moves
    let mut extreme_moves = 0usize;
    let mut max_move = 0.0f64;
    for pair in bars.windows(2) {
        let prev = pair[0].close;
        let curr = pair[1].close;
        if prev > 0.0 {
            let daily_return = (curr - prev).abs() / prev;
            if daily_return > config.max_single_day_return {
                extreme_moves += 1;
                max_move = max_move.max(daily_return);
            }
        }
    }
    if extreme_moves > 0 {
        warnings.push(format!(
            "Extreme price movements detected: {} days with |return| > {:.0}% (max: {:.1}%)",
            extreme_moves,
            config.max_single_day_return * 100.0,
            max_move * 100.0
        ));
    }

    // OHLC consistency: low <= open/close <= high
    let inconsistent = bars
        .iter()
        .filter(|bar| {
            let (Some(high), Some(low)) = (bar.high, bar.low) else {
                return false;
            };
            let open_bad = bar.open.map(|open| open < low || open > high).unwrap_or(false);
            low > high || bar.close < low || bar.close > high || open_bad
        })
        .count();
    if inconsistent > 0 {
        errors.push(format!(
            "OHLC inconsistencies (close/open outside [low, high]): {} occurrences",
            inconsistent
        ));
    }

    ValidationReport {
        symbol: symbol.to_string(),
        is_valid: errors.is_empty(),
        errors,
        warnings,
        data_points,
        missing_business_days,
        missing_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: NaiveDate, close: f64) -> timeseries_data::Model {
        timeseries_data::Model {
            id: 0,
            risk_factor_id: 1,
            date,
            open: Some(close),
            high: Some(close * 1.01),
            low: Some(close * 0.99),
            close,
            adj_close: Some(close),
            volume: Some(1_000_000.0),
            data_quality: "good".to_string(),
        }
    }

    fn day(d: u32) -> NaiveDate {
        // January 2024: the 1st is a Monday
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_clean_series_is_valid() {
        let bars: Vec<_> = (1..=5).map(|d| bar(day(d), 100.0 + d as f64)).collect();
        let report = validate_bars("AAPL", &bars, &ValidationConfig::default());

        assert!(report.is_valid);
        assert!(report.errors.is_empty());
        assert_eq!(report.data_points, 5);
        assert_eq!(report.missing_business_days, 0);
    }

    #[test]
    fn test_missing_business_days_flagged() {
        // Mon 1st and Fri 5th stored; Tue-Thu missing
        let bars = vec![bar(day(1), 100.0), bar(day(5), 101.0)];
        let report = validate_bars("AAPL", &bars, &ValidationConfig::default());

        assert_eq!(report.missing_business_days, 3);
        assert!(report.warnings.iter().any(|w| w.contains("missing business days")));
    }

    #[test]
    fn test_invalid_price_is_error() {
        let bars = vec![bar(day(1), 100.0), bar(day(2), -4.0)];
        let report = validate_bars("AAPL", &bars, &ValidationConfig::default());

        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("Invalid prices")));
    }

    #[test]
    fn test_extreme_move_is_warning_not_error() {
        let bars = vec![bar(day(1), 100.0), bar(day(2), 160.0)];
        let report = validate_bars("AAPL", &bars, &ValidationConfig::default());

        assert!(report.is_valid);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("Extreme price movements")));
    }

    #[test]
    fn test_ohlc_inconsistency_is_error() {
        let mut broken = bar(day(1), 100.0);
        broken.low = Some(101.0);
        broken.high = Some(99.0);
        let report = validate_bars("AAPL", &[broken], &ValidationConfig::default());

        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("OHLC")));
    }
}
