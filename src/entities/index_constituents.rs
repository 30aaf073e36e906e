//! `SeaORM` Entity for the index_constituents table
//!
//! Slowly-changing-dimension membership history: one row per
//! (index, symbol, effective interval). An open interval (`end_date` NULL)
//! means the symbol is currently a member. A symbol that leaves and later
//! re-enters gets a fresh row, never a reopened one.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "index_constituents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub index_id: i32,
    /// Trimmed, uppercased ticker symbol
    pub symbol: String,
    /// Inclusive start of the membership interval
    pub effective_date: Date,
    /// Exclusive end of the membership interval; NULL while still a member
    pub end_date: Option<Date>,
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub sub_industry: Option<String>,
    /// Pre-tracking addition date as reported by the source, if known
    pub date_added_to_index: Option<Date>,
    /// When the snapshot that produced this row was taken
    pub extracted_at: DateTime,
    pub data_source: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::indices::Entity",
        from = "Column::IndexId",
        to = "super::indices::Column::Id"
    )]
    Indices,
}

impl Related<super::indices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Indices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
