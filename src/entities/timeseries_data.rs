//! `SeaORM` Entity for the timeseries_data table
//!
//! Daily OHLCV bars keyed by (risk_factor_id, date).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "timeseries_data")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub risk_factor_id: i32,
    pub date: Date,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub adj_close: Option<f64>,
    pub volume: Option<f64>,
    pub data_quality: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::risk_factors::Entity",
        from = "Column::RiskFactorId",
        to = "super::risk_factors::Column::Id"
    )]
    RiskFactors,
}

impl Related<super::risk_factors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RiskFactors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
