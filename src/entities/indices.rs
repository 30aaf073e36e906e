//! `SeaORM` Entity for the indices table
//!
//! Registry of tracked equity indices. One row per index code; descriptive
//! fields are refreshed on every successful update, `last_updated` is bumped
//! by every successful reconciliation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "indices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Unique short identifier (e.g. "SP500", "DOW30")
    #[sea_orm(unique)]
    pub index_code: String,
    pub index_name: String,
    pub description: Option<String>,
    pub country: Option<String>,
    pub asset_class: String,
    pub data_source: Option<String>,
    pub created_at: Option<DateTime>,
    pub last_updated: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::index_constituents::Entity")]
    IndexConstituents,
}

impl Related<super::index_constituents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IndexConstituents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
