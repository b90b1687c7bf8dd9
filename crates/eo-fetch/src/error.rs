//! Error types for the fetch pipeline.

use eo_patch::PatchError;

/// Errors from configuring or running a fetch task.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid fetch configuration: {0}")]
    Config(String),

    #[error("Existing patch timestamps do not match the resolved acquisition times")]
    TimestampMismatch,

    #[error("No scenes found for {0}")]
    NoScenes(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FetchError>;
