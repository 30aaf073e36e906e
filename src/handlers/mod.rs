pub mod indices;
pub mod quality;

use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;

use crate::error::{StoreError, UpdateError, UpdateErrorKind};
use crate::models::index::ErrorResponse;

pub(crate) fn parse_date(
    raw: &str,
    param: &str,
) -> Result<NaiveDate, (StatusCode, Json<ErrorResponse>)> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Invalid {} format. Use YYYY-MM-DD", param),
            }),
        )
    })
}

pub(crate) fn store_error_response(e: StoreError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        StoreError::NotRegistered(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse { error: e.to_string() }))
}

pub(crate) fn update_error_response(e: UpdateError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &e.source {
        UpdateErrorKind::Fetch(_) => StatusCode::BAD_GATEWAY,
        UpdateErrorKind::Store(StoreError::NotRegistered(_)) => StatusCode::NOT_FOUND,
        UpdateErrorKind::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse { error: e.to_string() }))
}
