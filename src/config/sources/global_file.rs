//! User-level config file: `$XDG_CONFIG_HOME/sheetsmith/config.toml`, falling back to
//! `~/.config/sheetsmith/config.toml`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::PathBuf;
use tracing::debug;

pub fn global_config_path() -> Option<PathBuf> {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(std::env::var("HOME").ok()?).join(".config"),
    };
    Some(base.join("sheetsmith").join("config.toml"))
}

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let Some(path) = global_config_path() else {
        return Ok(builder);
    };
    if !path.is_file() {
        debug!(config_path = %path.display(), "No user config file");
        return Ok(builder);
    }
    Ok(builder.add_source(File::from(path)))
}
