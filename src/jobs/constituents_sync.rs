use sea_orm::DatabaseConnection;
use tokio::time::{interval, Duration};

use crate::services::index_updater::IndexUpdater;
use crate::services::sync_status::{self, intervals, jobs};

/// Periodically refresh constituent membership for the configured indices.
///
/// The tick is much shorter than the sync interval; sync_status decides
/// whether a tick actually fetches, so restarts don't re-hit the source.
pub async fn start_constituents_sync_job(
    db: DatabaseConnection,
    updater: IndexUpdater,
    index_codes: Vec<String>,
) {
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(21600)); // Check every 6 hours

        loop {
            interval.tick().await;

            match sync_status::should_sync(&db, jobs::CONSTITUENTS_SYNC).await {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::error!("Failed to read sync status: {}", e);
                    continue;
                }
            }

            tracing::info!("Starting scheduled constituents sync");
            let results = updater.update_all(&index_codes).await;

            let failures: Vec<String> = results
                .iter()
                .filter_map(|(code, outcome)| {
                    outcome.as_ref().err().map(|e| format!("{}: {}", code, e))
                })
                .collect();

            let record_result = if failures.is_empty() {
                tracing::info!("Constituents sync complete for {} indices", results.len());
                sync_status::record_success(&db, jobs::CONSTITUENTS_SYNC, intervals::CONSTITUENTS_SYNC)
                    .await
            } else {
                tracing::error!(
                    "Constituents sync finished with {} failures",
                    failures.len()
                );
                sync_status::record_failure(
                    &db,
                    jobs::CONSTITUENTS_SYNC,
                    &failures.join("; "),
                    intervals::CONSTITUENTS_SYNC,
                )
                .await
            };

            if let Err(e) = record_result {
                tracing::error!("Failed to record sync status: {}", e);
            }
        }
    });
}
