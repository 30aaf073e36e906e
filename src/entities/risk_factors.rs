//! `SeaORM` Entity for the risk_factors table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "risk_factors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub symbol: String,
    pub asset_class: String,
    pub asset_subclass: Option<String>,
    pub description: Option<String>,
    pub currency: Option<String>,
    pub country: Option<String>,
    pub sector: Option<String>,
    pub data_source: String,
    pub frequency: String,
    /// First date with stored bars, maintained by metadata refresh
    pub start_date: Option<Date>,
    /// Last date with stored bars, maintained by metadata refresh
    pub end_date: Option<Date>,
    pub last_updated: Option<DateTime>,
    pub is_active: bool,
    pub created_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::timeseries_data::Entity")]
    TimeseriesData,
}

impl Related<super::timeseries_data::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TimeseriesData.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
