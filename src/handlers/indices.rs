use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;

use super::{parse_date, store_error_response, update_error_response};
use crate::models::index::{
    ChangesQuery, ChangesResponse, ConstituentEntry, ConstituentsResponse, ErrorResponse,
    HistoricalQuery, IndexListResponse, MembershipQuery, MembershipResponse,
};
use crate::services::index_updater::UpdateReport;
use crate::AppState;

pub async fn list_indices(
    State(state): State<AppState>,
) -> Result<Json<IndexListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let indices = state
        .registry
        .list()
        .await
        .map_err(store_error_response)?;

    Ok(Json(IndexListResponse {
        indices: indices.into_iter().map(Into::into).collect(),
    }))
}

pub async fn get_current_constituents(
    State(state): State<AppState>,
    Path(index_code): Path<String>,
) -> Result<Json<ConstituentsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let constituents = state
        .membership
        .current(&index_code)
        .await
        .map_err(store_error_response)?;

    let entries: Vec<ConstituentEntry> = constituents.into_iter().map(Into::into).collect();
    Ok(Json(ConstituentsResponse {
        index_code,
        as_of: None,
        count: entries.len(),
        constituents: entries,
    }))
}

pub async fn get_historical_constituents(
    State(state): State<AppState>,
    Path(index_code): Path<String>,
    Query(params): Query<HistoricalQuery>,
) -> Result<Json<ConstituentsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let as_of = parse_date(&params.as_of, "as_of")?;

    let constituents = state
        .membership
        .as_of(&index_code, as_of)
        .await
        .map_err(store_error_response)?;

    let entries: Vec<ConstituentEntry> = constituents.into_iter().map(Into::into).collect();
    Ok(Json(ConstituentsResponse {
        index_code,
        as_of: Some(as_of),
        count: entries.len(),
        constituents: entries,
    }))
}

pub async fn check_membership(
    State(state): State<AppState>,
    Path(index_code): Path<String>,
    Query(params): Query<MembershipQuery>,
) -> Result<Json<MembershipResponse>, (StatusCode, Json<ErrorResponse>)> {
    let date = match &params.date {
        Some(raw) => Some(parse_date(raw, "date")?),
        None => None,
    };
    let resolved_date = date.unwrap_or_else(|| chrono::Utc::now().date_naive());

    let is_member = state
        .membership
        .is_member(&params.symbol, &index_code, Some(resolved_date))
        .await
        .map_err(store_error_response)?;

    Ok(Json(MembershipResponse {
        index_code,
        symbol: params.symbol,
        date: resolved_date,
        is_member,
    }))
}

pub async fn get_changes(
    State(state): State<AppState>,
    Path(index_code): Path<String>,
    Query(params): Query<ChangesQuery>,
) -> Result<Json<ChangesResponse>, (StatusCode, Json<ErrorResponse>)> {
    let start: Option<NaiveDate> = match &params.start_date {
        Some(raw) => Some(parse_date(raw, "start_date")?),
        None => None,
    };
    let end: Option<NaiveDate> = match &params.end_date {
        Some(raw) => Some(parse_date(raw, "end_date")?),
        None => None,
    };

    let changes = state
        .membership
        .changes(&index_code, start, end)
        .await
        .map_err(store_error_response)?;

    Ok(Json(ChangesResponse {
        index_code,
        count: changes.len(),
        changes,
    }))
}

pub async fn trigger_update(
    State(state): State<AppState>,
    Path(index_code): Path<String>,
) -> Result<Json<UpdateReport>, (StatusCode, Json<ErrorResponse>)> {
    let report = state
        .updater
        .update_index(&index_code, None)
        .await
        .map_err(update_error_response)?;

    Ok(Json(report))
}
