//! Sync status tracking for background jobs.
//!
//! Records when each job last ran so a process restart doesn't immediately
//! re-hit the external source inside its minimum interval.

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::sync_status::{self, Entity as SyncStatus};
use crate::error::StoreError;

/// Job names for tracking sync status
pub mod jobs {
    pub const CONSTITUENTS_SYNC: &str = "index_constituents_sync";
}

/// Default minimum intervals between syncs (in seconds)
pub mod intervals {
    pub const CONSTITUENTS_SYNC: i32 = 86400; // constituents change rarely
}

/// Should this job run now? True on first run, or when the last successful
/// run is older than the job's minimum interval.
pub async fn should_sync(db: &DatabaseConnection, job_name: &str) -> Result<bool, StoreError> {
    let status = SyncStatus::find()
        .filter(sync_status::Column::JobName.eq(job_name))
        .one(db)
        .await
        .map_err(StoreError::db(job_name, "load sync status"))?;

    match status {
        None => {
            tracing::info!("[{}] First run detected, will sync", job_name);
            Ok(true)
        }
        Some(record) => match record.last_success_at {
            None => {
                tracing::info!("[{}] No previous successful sync, will sync", job_name);
                Ok(true)
            }
            Some(last_success) => {
                let now = Utc::now().naive_utc();
                let elapsed = now.signed_duration_since(last_success);
                let interval = Duration::seconds(record.min_interval_secs as i64);

                if elapsed >= interval {
                    tracing::info!(
                        "[{}] Last sync was {}s ago (min: {}s), will sync",
                        job_name,
                        elapsed.num_seconds(),
                        record.min_interval_secs
                    );
                    Ok(true)
                } else {
                    tracing::info!(
                        "[{}] Skipping sync - next sync in {}s",
                        job_name,
                        (interval - elapsed).num_seconds()
                    );
                    Ok(false)
                }
            }
        },
    }
}

pub async fn record_success(
    db: &DatabaseConnection,
    job_name: &str,
    default_interval_secs: i32,
) -> Result<(), StoreError> {
    let now = Utc::now().naive_utc();

    let existing = SyncStatus::find()
        .filter(sync_status::Column::JobName.eq(job_name))
        .one(db)
        .await
        .map_err(StoreError::db(job_name, "record sync success"))?;

    match existing {
        Some(record) => {
            let success_count = record.success_count;
            let mut active_model: sync_status::ActiveModel = record.into();
            active_model.last_success_at = Set(Some(now));
            active_model.last_attempt_at = Set(Some(now));
            active_model.last_error = Set(None);
            active_model.success_count = Set(success_count + 1);
            active_model
                .update(db)
                .await
                .map_err(StoreError::db(job_name, "record sync success"))?;
        }
        None => {
            let new_record = sync_status::ActiveModel {
                job_name: Set(job_name.to_string()),
                last_success_at: Set(Some(now)),
                last_attempt_at: Set(Some(now)),
                last_error: Set(None),
                success_count: Set(1),
                error_count: Set(0),
                min_interval_secs: Set(default_interval_secs),
                ..Default::default()
            };
            new_record
                .insert(db)
                .await
                .map_err(StoreError::db(job_name, "record sync success"))?;
        }
    }

    tracing::debug!("[{}] Recorded successful sync", job_name);
    Ok(())
}

pub async fn record_failure(
    db: &DatabaseConnection,
    job_name: &str,
    error: &str,
    default_interval_secs: i32,
) -> Result<(), StoreError> {
    let now = Utc::now().naive_utc();

    let existing = SyncStatus::find()
        .filter(sync_status::Column::JobName.eq(job_name))
        .one(db)
        .await
        .map_err(StoreError::db(job_name, "record sync failure"))?;

    match existing {
        Some(record) => {
            let error_count = record.error_count;
            let mut active_model: sync_status::ActiveModel = record.into();
            active_model.last_attempt_at = Set(Some(now));
            active_model.last_error = Set(Some(error.to_string()));
            active_model.error_count = Set(error_count + 1);
            active_model
                .update(db)
                .await
                .map_err(StoreError::db(job_name, "record sync failure"))?;
        }
        None => {
            let new_record = sync_status::ActiveModel {
                job_name: Set(job_name.to_string()),
                last_success_at: Set(None),
                last_attempt_at: Set(Some(now)),
                last_error: Set(Some(error.to_string())),
                success_count: Set(0),
                error_count: Set(1),
                min_interval_secs: Set(default_interval_secs),
                ..Default::default()
            };
            new_record
                .insert(db)
                .await
                .map_err(StoreError::db(job_name, "record sync failure"))?;
        }
    }

    tracing::debug!("[{}] Recorded failed sync: {}", job_name, error);
    Ok(())
}
