//! Error types shared across the pipeline.
//!
//! Library code surfaces typed errors: `ProfileError` for everything
//! between payload bytes and derived artifacts, `OutputError` for file
//! handling around them. The CLI layer wraps both with `anyhow` context
//! at each step.

use thiserror::Error;

/// Errors that can occur while decoding a raw profile and deriving
/// artifacts from it
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("payload deserialization failed: {0}")]
    Decode(#[from] serde_path_to_error::Error<serde_json::Error>),

    #[error("data integrity: {0}")]
    DataIntegrity(String),
}

/// Errors raised while reading envelope files or writing derived
/// artifacts to disk
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("file access failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unusable path: {0}")]
    Path(String),
}
