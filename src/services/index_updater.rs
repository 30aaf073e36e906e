//! Update orchestrator: source adapter -> registry -> membership store.
//!
//! Sequencing and error annotation only; the fetch has no retries here and
//! the store does its own transactional work. The registry upsert committing
//! before a reconciliation failure is fine, it is idempotent on its own.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::error::{FetchError, UpdateError, UpdatePhase};
use crate::scrapers::{ConstituentSource, IndexSourceConfig};
use crate::services::index_registry::IndexRegistry;
use crate::services::membership::{ChangeSummary, MembershipStore};

/// Caller-facing summary of one successful index update.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub index_code: String,
    pub index_name: String,
    pub total_constituents: usize,
    #[serde(flatten)]
    pub summary: ChangeSummary,
    pub extracted_at: NaiveDateTime,
    pub data_source: String,
}

#[derive(Clone)]
pub struct IndexUpdater {
    source: Arc<dyn ConstituentSource>,
    registry: IndexRegistry,
    membership: MembershipStore,
}

impl IndexUpdater {
    pub fn new(
        source: Arc<dyn ConstituentSource>,
        registry: IndexRegistry,
        membership: MembershipStore,
    ) -> Self {
        Self {
            source,
            registry,
            membership,
        }
    }

    /// Run the full single-index flow:
    /// FETCHING -> REGISTERING -> RECONCILING. The first failing phase aborts
    /// the rest and is reported with its phase attached.
    pub async fn update_index(
        &self,
        index_code: &str,
        effective_date: Option<NaiveDate>,
    ) -> Result<UpdateReport, UpdateError> {
        tracing::info!("Starting update for {}", index_code);

        let config = IndexSourceConfig::for_code(index_code).ok_or_else(|| {
            UpdateError::new(
                index_code,
                UpdatePhase::Fetching,
                FetchError::UnknownIndex(index_code.to_string()),
            )
        })?;
        let code = config.index_code.as_str();

        let snapshot = self
            .source
            .fetch_constituents(&config)
            .await
            .map_err(|e| UpdateError::new(code, UpdatePhase::Fetching, e))?;
        tracing::info!("Fetched {} constituents for {}", snapshot.len(), code);

        self.registry
            .register_or_update(
                code,
                &config.index_name,
                &config.description,
                &config.country,
                &config.data_source,
                &config.asset_class,
            )
            .await
            .map_err(|e| UpdateError::new(code, UpdatePhase::Registering, e))?;

        let extracted_at = Utc::now().naive_utc();
        let summary = self
            .membership
            .reconcile(code, &snapshot, Some(extracted_at), effective_date)
            .await
            .map_err(|e| UpdateError::new(code, UpdatePhase::Reconciling, e))?;

        tracing::info!(
            "Updated {}: +{} constituents, -{} constituents, ={} unchanged",
            code,
            summary.added_count,
            summary.removed_count,
            summary.unchanged_count
        );
        if summary.added_count > 0 {
            tracing::info!("Added symbols: {}", preview_symbols(&summary.added_symbols));
        }
        if summary.removed_count > 0 {
            tracing::info!(
                "Removed symbols: {}",
                preview_symbols(&summary.removed_symbols)
            );
        }

        Ok(UpdateReport {
            index_code: code.to_string(),
            index_name: config.index_name,
            total_constituents: snapshot.len(),
            summary,
            extracted_at,
            data_source: config.data_source,
        })
    }

    /// Run the single-index flow for each code in turn. One index's failure
    /// is captured in the result map and never aborts the remaining indices.
    /// Sequential on purpose: the external source is rate limited.
    pub async fn update_all(
        &self,
        index_codes: &[String],
    ) -> BTreeMap<String, Result<UpdateReport, UpdateError>> {
        let mut results = BTreeMap::new();

        for index_code in index_codes {
            tracing::info!("Updating {}...", index_code);
            let outcome = self.update_index(index_code, None).await;
            if let Err(ref e) = outcome {
                tracing::error!("Failed to update {}: {}", index_code, e);
            }
            results.insert(index_code.clone(), outcome);
        }

        results
    }
}

fn preview_symbols(symbols: &[String]) -> String {
    const PREVIEW: usize = 10;
    if symbols.len() <= PREVIEW {
        symbols.join(", ")
    } else {
        format!(
            "{} and {} more",
            symbols[..PREVIEW].join(", "),
            symbols.len() - PREVIEW
        )
    }
}
