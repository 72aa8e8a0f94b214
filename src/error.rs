//! Error types for the two external services.
use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the recipe source. An empty result is not an error.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to reach recipe source: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("recipe source error {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid recipe source response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("invalid recipe source URL: {0}")]
    InvalidUrl(String),
}

/// Failures talking to the favorites backend (auth or table).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Supabase not configured")]
    NotConfigured,
    #[error("failed to reach store: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("store rejected request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("invalid store response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("invalid store URL: {0}")]
    InvalidUrl(String),
}
