//! Baseline values every later layer is merged over. Files come next, environment last.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Storage lives under `.sheetsmith/` in the workspace unless overridden.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let storage = Config::builder()
        .set_default("storage.store_path", ".sheetsmith/store")?
        .set_default("storage.objects_path", ".sheetsmith/objects")?;
    storage
        .set_default("generation.quality_batch_size", 3)?
        .set_default("generation.speed_batch_size", 5)?
        .set_default("generation.pacing_ms", 1000)
}
