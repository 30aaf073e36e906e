//! Index registry: resolves short index codes to stored identities and keeps
//! their descriptive metadata current.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::{indices, prelude::*};
use crate::error::StoreError;

#[derive(Clone)]
pub struct IndexRegistry {
    db: DatabaseConnection,
}

impl IndexRegistry {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert the index if unknown, otherwise refresh its descriptive fields.
    /// Touches exactly one row either way and returns its id.
    pub async fn register_or_update(
        &self,
        index_code: &str,
        index_name: &str,
        description: &str,
        country: &str,
        data_source: &str,
        asset_class: &str,
    ) -> Result<i32, StoreError> {
        let existing = Indices::find()
            .filter(indices::Column::IndexCode.eq(index_code))
            .one(&self.db)
            .await
            .map_err(StoreError::db(index_code, "register_or_update"))?;

        let now = Utc::now().naive_utc();

        match existing {
            Some(record) => {
                let id = record.id;
                let mut active_model = record.into_active_model();
                active_model.index_name = Set(index_name.to_string());
                active_model.description = Set(Some(description.to_string()));
                active_model.country = Set(Some(country.to_string()));
                active_model.data_source = Set(Some(data_source.to_string()));
                active_model.asset_class = Set(asset_class.to_string());
                active_model.last_updated = Set(Some(now));
                active_model
                    .update(&self.db)
                    .await
                    .map_err(StoreError::db(index_code, "register_or_update"))?;

                tracing::info!("Updated index {} (id={})", index_code, id);
                Ok(id)
            }
            None => {
                let new_index = indices::ActiveModel {
                    index_code: Set(index_code.to_string()),
                    index_name: Set(index_name.to_string()),
                    description: Set(Some(description.to_string())),
                    country: Set(Some(country.to_string())),
                    data_source: Set(Some(data_source.to_string())),
                    asset_class: Set(asset_class.to_string()),
                    created_at: Set(Some(now)),
                    last_updated: Set(Some(now)),
                    ..Default::default()
                };

                let inserted = new_index
                    .insert(&self.db)
                    .await
                    .map_err(StoreError::db(index_code, "register_or_update"))?;

                tracing::info!("Registered new index {} (id={})", index_code, inserted.id);
                Ok(inserted.id)
            }
        }
    }

    pub async fn resolve(&self, index_code: &str) -> Result<Option<i32>, StoreError> {
        let found = Indices::find()
            .filter(indices::Column::IndexCode.eq(index_code))
            .one(&self.db)
            .await
            .map_err(StoreError::db(index_code, "resolve"))?;

        Ok(found.map(|record| record.id))
    }

    /// Like [`resolve`](Self::resolve) but an unknown code is an error.
    /// Nothing in the query or reconciliation path auto-registers.
    pub async fn require(&self, index_code: &str) -> Result<i32, StoreError> {
        self.resolve(index_code)
            .await?
            .ok_or_else(|| StoreError::NotRegistered(index_code.to_string()))
    }

    pub async fn list(&self) -> Result<Vec<indices::Model>, StoreError> {
        Indices::find()
            .order_by_asc(indices::Column::IndexCode)
            .all(&self.db)
            .await
            .map_err(StoreError::db("*", "list indices"))
    }
}
