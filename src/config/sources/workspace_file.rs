//! Workspace config files: `config/config.toml`, then `config/{SHEETSMITH_ENV}.toml`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};

const ENV_VAR: &str = "SHEETSMITH_ENV";
const DEFAULT_ENV: &str = "development";

/// Candidate files in merge order (later wins). Files that do not exist are skipped.
pub fn workspace_config_files(workspace_root: &Path, env_name: &str) -> Vec<PathBuf> {
    let dir = workspace_root.join("config");
    [dir.join("config.toml"), dir.join(format!("{env_name}.toml"))]
        .into_iter()
        .filter(|path| path.is_file())
        .collect()
}

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let env_name = std::env::var(ENV_VAR).unwrap_or_else(|_| DEFAULT_ENV.to_string());
    Ok(workspace_config_files(workspace_root, &env_name)
        .into_iter()
        .fold(builder, |builder, path| builder.add_source(File::from(path))))
}
