//! Request/response shapes for the index membership API.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::entities::{index_constituents, indices};
use crate::services::membership::ChangeEvent;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct IndexListEntry {
    pub index_code: String,
    pub index_name: String,
    pub country: Option<String>,
    pub asset_class: String,
    pub data_source: Option<String>,
    pub last_updated: Option<NaiveDateTime>,
}

impl From<indices::Model> for IndexListEntry {
    fn from(model: indices::Model) -> Self {
        Self {
            index_code: model.index_code,
            index_name: model.index_name,
            country: model.country,
            asset_class: model.asset_class,
            data_source: model.data_source,
            last_updated: model.last_updated,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IndexListResponse {
    pub indices: Vec<IndexListEntry>,
}

#[derive(Debug, Serialize)]
pub struct ConstituentEntry {
    pub symbol: String,
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub sub_industry: Option<String>,
    pub date_added_to_index: Option<NaiveDate>,
    pub effective_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub extracted_at: NaiveDateTime,
    pub data_source: String,
}

impl From<index_constituents::Model> for ConstituentEntry {
    fn from(model: index_constituents::Model) -> Self {
        Self {
            symbol: model.symbol,
            company_name: model.company_name,
            sector: model.sector,
            sub_industry: model.sub_industry,
            date_added_to_index: model.date_added_to_index,
            effective_date: model.effective_date,
            end_date: model.end_date,
            extracted_at: model.extracted_at,
            data_source: model.data_source,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConstituentsResponse {
    pub index_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
    pub count: usize,
    pub constituents: Vec<ConstituentEntry>,
}

#[derive(Debug, Deserialize)]
pub struct HistoricalQuery {
    pub as_of: String,
}

#[derive(Debug, Deserialize)]
pub struct MembershipQuery {
    pub symbol: String,
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub index_code: String,
    pub symbol: String,
    pub date: NaiveDate,
    pub is_member: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChangesQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChangesResponse {
    pub index_code: String,
    pub count: usize,
    pub changes: Vec<ChangeEvent>,
}
