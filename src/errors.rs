//! Error type definitions for the ingestion core.
//!
//! Mirrors the two error kinds the pipeline distinguishes: a per-record,
//! non-fatal [`InvalidDataError`] and a fatal [`DownloadError`], plus the
//! ambient [`ConfigError`] and [`SinkError`] types the rest of the stack needs.

use thiserror::Error;

/// A single rejected record. Carries a stable, short reason string used for
/// observability; never propagates past the orchestrator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct InvalidDataError(pub String);

impl InvalidDataError {
    pub fn new<S: Into<String>>(reason: S) -> Self {
        Self(reason.into())
    }
}

/// Fatal to the run: transport failures that exhausted retries, or a
/// malformed response the source cannot recover from.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("No content length found")]
    NoContentLength,

    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    #[error("request failed after exhausting retries: {0}")]
    RetriesExhausted(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Errors surfaced by an [`crate::sink::EntrySink`] implementation.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("database connection failed: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("commit failed: {0}")]
    Commit(String),
}

/// Configuration loading/validation failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    #[error("invalid configuration: {field} - {message}")]
    Invalid { field: String, message: String },
}

/// Top-level error returned from `main`, used only to pick an exit code.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("sink failed: {0}")]
    Sink(#[from] SinkError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl IngestError {
    /// Process exit code per the external-interfaces contract: 1 for a
    /// failed fetch, 2 for a failed commit, 3 for bad configuration.
    pub fn exit_code(&self) -> i32 {
        match self {
            IngestError::Download(_) => 1,
            IngestError::Sink(_) => 2,
            IngestError::Config(_) => 3,
        }
    }
}
