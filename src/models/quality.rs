//! Request shapes for the data-quality endpoints.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct QualityQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
