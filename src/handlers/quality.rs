use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;

use super::{parse_date, store_error_response};
use crate::models::index::ErrorResponse;
use crate::models::quality::QualityQuery;
use crate::services::dashboard::OverviewStats;
use crate::services::quality::{validate_bars, ValidationConfig, ValidationReport};
use crate::AppState;

pub async fn get_overview(
    State(state): State<AppState>,
) -> Result<Json<OverviewStats>, (StatusCode, Json<ErrorResponse>)> {
    let stats = state
        .dashboard
        .overview()
        .await
        .map_err(store_error_response)?;

    Ok(Json(stats))
}

pub async fn get_symbol_quality(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<QualityQuery>,
) -> Result<Json<ValidationReport>, (StatusCode, Json<ErrorResponse>)> {
    let start: Option<NaiveDate> = match &params.start_date {
        Some(raw) => Some(parse_date(raw, "start_date")?),
        None => None,
    };
    let end: Option<NaiveDate> = match &params.end_date {
        Some(raw) => Some(parse_date(raw, "end_date")?),
        None => None,
    };

    let bars = state
        .timeseries
        .bars(&symbol, "equity", "market_data", start, end)
        .await
        .map_err(store_error_response)?;

    if bars.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No stored bars found for symbol '{}'", symbol),
            }),
        ));
    }

    let report = validate_bars(&symbol, &bars, &ValidationConfig::default());
    Ok(Json(report))
}
