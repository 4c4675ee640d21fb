//! Configuration System
//!
//! Layered configuration for the image provider, storage locations, batch scheduling and
//! logging. Files and environment variables are merged by [`ConfigLoader`].

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod facade;
mod merge;
mod sources;
mod workspace;

pub use crate::provider::{ProviderConfig, ProviderType};
pub use facade::ConfigLoader;
pub use workspace::StorageConfig;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetsmithConfig {
    /// External image model
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Record and object storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Batch scheduling
    #[serde(default)]
    pub generation: GenerationSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Batch scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Default batch size for `quality` priority
    #[serde(default = "default_quality_batch_size")]
    pub quality_batch_size: usize,

    /// Default batch size for `speed` priority
    #[serde(default = "default_speed_batch_size")]
    pub speed_batch_size: usize,

    /// Delay between batches (milliseconds)
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    /// Upper bound for one frame generation call, including storage (seconds)
    #[serde(default = "default_frame_timeout_secs")]
    pub frame_timeout_secs: u64,

    /// Rough per-frame duration used for acknowledgement estimates (seconds)
    #[serde(default = "default_estimate_quality_secs")]
    pub estimated_secs_per_frame_quality: u64,

    #[serde(default = "default_estimate_speed_secs")]
    pub estimated_secs_per_frame_speed: u64,
}

fn default_quality_batch_size() -> usize {
    3
}

fn default_speed_batch_size() -> usize {
    5
}

fn default_pacing_ms() -> u64 {
    1000
}

fn default_frame_timeout_secs() -> u64 {
    180
}

fn default_estimate_quality_secs() -> u64 {
    20
}

fn default_estimate_speed_secs() -> u64 {
    10
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            quality_batch_size: default_quality_batch_size(),
            speed_batch_size: default_speed_batch_size(),
            pacing_ms: default_pacing_ms(),
            frame_timeout_secs: default_frame_timeout_secs(),
            estimated_secs_per_frame_quality: default_estimate_quality_secs(),
            estimated_secs_per_frame_speed: default_estimate_speed_secs(),
        }
    }
}

impl GenerationSettings {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_secs(self.frame_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.quality_batch_size == 0 || self.speed_batch_size == 0 {
            return Err("batch sizes must be at least 1".to_string());
        }
        if self.frame_timeout_secs == 0 {
            return Err("frame_timeout_secs must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Provider(String),
    Generation(String),
    Storage(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
            ValidationError::Generation(msg) => write!(f, "Generation: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SheetsmithConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if let Err(e) = self.generation.validate() {
            errors.push(ValidationError::Generation(e));
        }
        if self.storage.store_path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage(
                "store_path cannot be empty".to_string(),
            ));
        }
        if self.storage.objects_path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage(
                "objects_path cannot be empty".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
