//! Error types for the constituent pipeline.
//!
//! Fetching, storage and orchestration fail differently and are kept as
//! separate types so callers can react per failure domain. The orchestrator
//! folds everything into [`UpdateError`], annotated with the index code and
//! the phase that failed.

use sea_orm::DbErr;
use thiserror::Error;

/// Failures while fetching or parsing an external constituents snapshot.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no source configuration for index {0}")]
    UnknownIndex(String),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to parse data for {context}: {message}")]
    Parse { context: String, message: String },

    /// Every row of the snapshot was unusable. Reconciling against it would
    /// close out the whole index, so it is rejected like a failed fetch.
    #[error("snapshot for {index_code} contained no valid rows")]
    EmptySnapshot { index_code: String },
}

/// Failures in the registry or the temporal membership store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("index {0} is not registered")]
    NotRegistered(String),

    #[error("{operation} failed for {context}: {source}")]
    Db {
        context: String,
        operation: &'static str,
        #[source]
        source: DbErr,
    },

    /// A mutation would leave interval history inconsistent (e.g. closing an
    /// interval before it started). The surrounding transaction is rolled
    /// back before this is returned.
    #[error("{operation} for {index_code} rejected: {message}")]
    InvalidInterval {
        index_code: String,
        operation: &'static str,
        message: String,
    },

    #[error("refusing to reconcile {index_code} against an empty snapshot")]
    EmptySnapshot { index_code: String },
}

impl StoreError {
    /// Adapter for `map_err` when a SeaORM call fails inside `operation`;
    /// `context` is the index code or symbol being worked on.
    pub fn db(context: &str, operation: &'static str) -> impl FnOnce(DbErr) -> StoreError {
        let context = context.to_string();
        move |source| StoreError::Db {
            context,
            operation,
            source,
        }
    }
}

/// Phase of the single-index update flow that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdatePhase {
    Fetching,
    Registering,
    Reconciling,
}

impl std::fmt::Display for UpdatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdatePhase::Fetching => write!(f, "fetching"),
            UpdatePhase::Registering => write!(f, "registering"),
            UpdatePhase::Reconciling => write!(f, "reconciling"),
        }
    }
}

#[derive(Debug, Error)]
pub enum UpdateErrorKind {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Single public error type of the update orchestrator.
#[derive(Debug, Error)]
#[error("update of {index_code} failed while {phase}: {source}")]
pub struct UpdateError {
    pub index_code: String,
    pub phase: UpdatePhase,
    #[source]
    pub source: UpdateErrorKind,
}

impl UpdateError {
    pub fn new(
        index_code: impl Into<String>,
        phase: UpdatePhase,
        source: impl Into<UpdateErrorKind>,
    ) -> Self {
        UpdateError {
            index_code: index_code.into(),
            phase,
            source: source.into(),
        }
    }
}

/// Failures in the rate-limited bulk bar loader.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("invalid loader configuration: {0}")]
    Config(String),

    #[error("download for {symbol} failed after {attempts} attempts: {source}")]
    Download {
        symbol: String,
        attempts: u32,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
