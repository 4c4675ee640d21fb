//! Configuration loader: merges defaults, global file, workspace files and environment.

use crate::config::merge::merge_policy;
use crate::config::sources::{global_file, workspace_file};
use crate::config::SheetsmithConfig;
use crate::error::ApiError;
use config::{Environment, File};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global file, `config/config.toml`,
    /// `config/{SHEETSMITH_ENV}.toml`, `SHEETSMITH__SECTION__KEY` environment variables.
    pub fn load(workspace_root: &Path) -> Result<SheetsmithConfig, ApiError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let config = builder.add_source(env_source()).build()?;
        Ok(config.try_deserialize()?)
    }

    /// Load configuration from a single explicit file (environment still applies).
    pub fn load_from_file(path: &Path) -> Result<SheetsmithConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let config = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()))
            .add_source(env_source())
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Path of the user-level config file, if one can be determined.
    pub fn xdg_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("SHEETSMITH")
        .separator("__")
        .try_parsing(true)
}
