//! Error types for the sprite sheet generation orchestrator.

use crate::types::{FrameId, SheetId};
use thiserror::Error;

/// Storage-related errors (metadata records and stored objects)
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Sheet not found: {0}")]
    SheetNotFound(SheetId),

    #[error("Frame not found: {frame_id} in sheet {sheet_id}")]
    FrameNotFound { sheet_id: SheetId, frame_id: FrameId },

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Invalid frame transition for {frame_id}: {from} -> {to}")]
    InvalidTransition {
        frame_id: FrameId,
        from: &'static str,
        to: &'static str,
    },

    #[error("Invalid frame update for {frame_id}: {reason}")]
    InvalidUpdate { frame_id: FrameId, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::IoError(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("sled: {}", err),
        ))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Failure of a single frame generation. Always carried as a value; never aborts sibling frames.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("model returned no image")]
    NoImage,

    #[error("generation timed out after {0}s")]
    Timeout(u64),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("provider rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("provider authentication failed: {0}")]
    AuthFailed(String),

    #[error("image storage failed: {0}")]
    Storage(String),

    #[error("status write failed: {0}")]
    StatusWrite(String),

    #[error("generation cancelled")]
    Cancelled,
}

impl From<StorageError> for GenerationError {
    fn from(err: StorageError) -> Self {
        GenerationError::Storage(err.to_string())
    }
}

/// Top-level errors surfaced to callers of the orchestrator and CLI
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Sheet not found: {0}")]
    SheetNotFound(SheetId),

    #[error("Generation already in progress for sheet {0}")]
    GenerationInProgress(SheetId),

    #[error("No generation job for sheet {0}")]
    JobNotFound(SheetId),

    #[error("Generation job failed: {0}")]
    JobFailed(String),

    #[error("Composite assembly failed: {0}")]
    CompositeFailed(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
