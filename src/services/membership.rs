//! Temporal membership store for index constituents.
//!
//! Membership is recorded as effective-dated intervals: an open interval
//! (`end_date` NULL) per currently-held symbol, closed intervals for past
//! membership. Reconciliation diffs a fresh snapshot against the open set
//! and mutates intervals inside a single transaction, so readers never see a
//! half-applied update.
//!
//! Invariants maintained here:
//! - at most one open interval per (index, symbol);
//! - an interval is never closed before it started;
//! - a departed symbol that returns gets a new interval, the old one stays
//!   closed.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::{index_constituents, indices, prelude::*};
use crate::error::StoreError;
use crate::scrapers::ConstituentRow;
use crate::services::index_registry::IndexRegistry;

/// Outcome of one reconciliation pass. Symbol lists are sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub added_count: usize,
    pub removed_count: usize,
    pub unchanged_count: usize,
    pub added_symbols: Vec<String>,
    pub removed_symbols: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
}

/// One membership change: a symbol entering or leaving an index on a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub date: NaiveDate,
    pub change_type: ChangeType,
    pub symbol: String,
    pub company_name: Option<String>,
}

#[derive(Clone)]
pub struct MembershipStore {
    db: DatabaseConnection,
    registry: IndexRegistry,
}

impl MembershipStore {
    pub fn new(db: DatabaseConnection, registry: IndexRegistry) -> Self {
        Self { db, registry }
    }

    /// Current members: open intervals, ordered by symbol.
    pub async fn current(
        &self,
        index_code: &str,
    ) -> Result<Vec<index_constituents::Model>, StoreError> {
        let index_id = self.registry.require(index_code).await?;

        IndexConstituents::find()
            .filter(index_constituents::Column::IndexId.eq(index_id))
            .filter(index_constituents::Column::EndDate.is_null())
            .order_by_asc(index_constituents::Column::Symbol)
            .all(&self.db)
            .await
            .map_err(StoreError::db(index_code, "current constituents"))
    }

    /// Members as of a date: intervals with
    /// `effective_date <= date AND (end_date IS NULL OR end_date > date)`.
    pub async fn as_of(
        &self,
        index_code: &str,
        date: NaiveDate,
    ) -> Result<Vec<index_constituents::Model>, StoreError> {
        let index_id = self.registry.require(index_code).await?;

        IndexConstituents::find()
            .filter(index_constituents::Column::IndexId.eq(index_id))
            .filter(index_constituents::Column::EffectiveDate.lte(date))
            .filter(
                Condition::any()
                    .add(index_constituents::Column::EndDate.is_null())
                    .add(index_constituents::Column::EndDate.gt(date)),
            )
            .order_by_asc(index_constituents::Column::Symbol)
            .all(&self.db)
            .await
            .map_err(StoreError::db(index_code, "historical constituents"))
    }

    /// Was `symbol` a member of the index on `date` (default: today)?
    pub async fn is_member(
        &self,
        symbol: &str,
        index_code: &str,
        date: Option<NaiveDate>,
    ) -> Result<bool, StoreError> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let index_id = self.registry.require(index_code).await?;

        let count = IndexConstituents::find()
            .filter(index_constituents::Column::IndexId.eq(index_id))
            .filter(index_constituents::Column::Symbol.eq(symbol))
            .filter(index_constituents::Column::EffectiveDate.lte(date))
            .filter(
                Condition::any()
                    .add(index_constituents::Column::EndDate.is_null())
                    .add(index_constituents::Column::EndDate.gt(date)),
            )
            .count(&self.db)
            .await
            .map_err(StoreError::db(index_code, "membership check"))?;

        Ok(count > 0)
    }

    /// Reconcile stored membership against a fresh snapshot.
    ///
    /// Removed symbols get their open interval closed at `effective_date`,
    /// added symbols get a new open interval carrying the snapshot's
    /// descriptive fields, unchanged symbols are left exactly as they are
    /// (membership changes mutate state, metadata drift does not). All
    /// mutations plus the registry timestamp bump run in one transaction.
    pub async fn reconcile(
        &self,
        index_code: &str,
        snapshot: &[ConstituentRow],
        extracted_at: Option<NaiveDateTime>,
        effective_date: Option<NaiveDate>,
    ) -> Result<ChangeSummary, StoreError> {
        let extracted_at = extracted_at.unwrap_or_else(|| Utc::now().naive_utc());
        let effective_date = effective_date.unwrap_or_else(|| Utc::now().date_naive());

        let index_id = self.registry.require(index_code).await?;

        // Keep the first row per symbol; rows without a usable symbol are
        // dropped with a warning rather than failing the whole pass.
        let mut by_symbol: BTreeMap<String, &ConstituentRow> = BTreeMap::new();
        let mut dropped = 0usize;
        for row in snapshot {
            let symbol = row.symbol.trim();
            if symbol.is_empty() {
                dropped += 1;
                continue;
            }
            by_symbol.entry(symbol.to_string()).or_insert(row);
        }

        if dropped > 0 {
            tracing::warn!(
                "Dropped {}/{} snapshot rows without symbols for {}",
                dropped,
                snapshot.len(),
                index_code
            );
        }

        // An empty snapshot would close out every current member
        if by_symbol.is_empty() {
            return Err(StoreError::EmptySnapshot {
                index_code: index_code.to_string(),
            });
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(StoreError::db(index_code, "begin reconciliation"))?;

        let open_intervals = IndexConstituents::find()
            .filter(index_constituents::Column::IndexId.eq(index_id))
            .filter(index_constituents::Column::EndDate.is_null())
            .all(&txn)
            .await
            .map_err(StoreError::db(index_code, "load current constituents"))?;

        let current_symbols: BTreeSet<String> = open_intervals
            .iter()
            .map(|interval| interval.symbol.clone())
            .collect();
        let new_symbols: BTreeSet<String> = by_symbol.keys().cloned().collect();

        let added_symbols: Vec<String> =
            new_symbols.difference(&current_symbols).cloned().collect();
        let removed_symbols: Vec<String> =
            current_symbols.difference(&new_symbols).cloned().collect();
        let unchanged_count = current_symbols.intersection(&new_symbols).count();

        // Close out removed constituents
        if !removed_symbols.is_empty() {
            let result = IndexConstituents::update_many()
                .col_expr(
                    index_constituents::Column::EndDate,
                    Expr::value(effective_date),
                )
                .filter(index_constituents::Column::IndexId.eq(index_id))
                .filter(index_constituents::Column::Symbol.is_in(removed_symbols.clone()))
                .filter(index_constituents::Column::EndDate.is_null())
                .filter(index_constituents::Column::EffectiveDate.lte(effective_date))
                .exec(&txn)
                .await
                .map_err(StoreError::db(index_code, "close removed constituents"))?;

            // Fewer rows than removed symbols means the effective date lands
            // before some open interval even started; dropping the
            // uncommitted transaction rolls everything back.
            if result.rows_affected != removed_symbols.len() as u64 {
                return Err(StoreError::InvalidInterval {
                    index_code: index_code.to_string(),
                    operation: "close removed constituents",
                    message: format!(
                        "effective date {} predates the open interval of {} symbol(s)",
                        effective_date,
                        removed_symbols.len() as u64 - result.rows_affected
                    ),
                });
            }

            tracing::info!(
                "Closed out {} removed constituents of {}",
                removed_symbols.len(),
                index_code
            );
        }

        // Insert added constituents as fresh open intervals
        if !added_symbols.is_empty() {
            let models: Vec<index_constituents::ActiveModel> = added_symbols
                .iter()
                .map(|symbol| {
                    let row = by_symbol[symbol.as_str()];
                    index_constituents::ActiveModel {
                        index_id: Set(index_id),
                        symbol: Set(symbol.clone()),
                        effective_date: Set(effective_date),
                        end_date: Set(None),
                        company_name: Set(row.company_name.clone()),
                        sector: Set(row.sector.clone()),
                        sub_industry: Set(row.sub_industry.clone()),
                        date_added_to_index: Set(row.date_added_to_index),
                        extracted_at: Set(extracted_at),
                        data_source: Set(row.source.clone()),
                        ..Default::default()
                    }
                })
                .collect();

            IndexConstituents::insert_many(models)
                .exec(&txn)
                .await
                .map_err(StoreError::db(index_code, "insert added constituents"))?;

            tracing::info!(
                "Added {} new constituents to {}",
                added_symbols.len(),
                index_code
            );
        }

        Indices::update_many()
            .col_expr(
                indices::Column::LastUpdated,
                Expr::value(Utc::now().naive_utc()),
            )
            .filter(indices::Column::Id.eq(index_id))
            .exec(&txn)
            .await
            .map_err(StoreError::db(index_code, "bump index last_updated"))?;

        txn.commit()
            .await
            .map_err(StoreError::db(index_code, "commit reconciliation"))?;

        Ok(ChangeSummary {
            added_count: added_symbols.len(),
            removed_count: removed_symbols.len(),
            unchanged_count,
            added_symbols,
            removed_symbols,
        })
    }

    /// Membership changes in a date range, newest first. An interval both
    /// added and removed inside the range shows up as two events.
    pub async fn changes(
        &self,
        index_code: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<ChangeEvent>, StoreError> {
        let index_id = self.registry.require(index_code).await?;

        let mut added_query = IndexConstituents::find()
            .filter(index_constituents::Column::IndexId.eq(index_id));
        if let Some(start) = start {
            added_query =
                added_query.filter(index_constituents::Column::EffectiveDate.gte(start));
        }
        if let Some(end) = end {
            added_query = added_query.filter(index_constituents::Column::EffectiveDate.lte(end));
        }
        let added_rows = added_query
            .all(&self.db)
            .await
            .map_err(StoreError::db(index_code, "load additions"))?;

        let mut removed_query = IndexConstituents::find()
            .filter(index_constituents::Column::IndexId.eq(index_id))
            .filter(index_constituents::Column::EndDate.is_not_null());
        if let Some(start) = start {
            removed_query = removed_query.filter(index_constituents::Column::EndDate.gte(start));
        }
        if let Some(end) = end {
            removed_query = removed_query.filter(index_constituents::Column::EndDate.lte(end));
        }
        let removed_rows = removed_query
            .all(&self.db)
            .await
            .map_err(StoreError::db(index_code, "load removals"))?;

        let mut events: Vec<ChangeEvent> = Vec::with_capacity(added_rows.len() + removed_rows.len());

        for row in added_rows {
            events.push(ChangeEvent {
                date: row.effective_date,
                change_type: ChangeType::Added,
                symbol: row.symbol,
                company_name: row.company_name,
            });
        }
        for row in removed_rows {
            if let Some(end_date) = row.end_date {
                events.push(ChangeEvent {
                    date: end_date,
                    change_type: ChangeType::Removed,
                    symbol: row.symbol,
                    company_name: row.company_name,
                });
            }
        }

        events.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.symbol.cmp(&b.symbol)));
        Ok(events)
    }
}
