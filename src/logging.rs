//! Tracing subscriber setup for the CLI: level filter, text or json lines, and a
//! stdout, stderr or file destination.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// `[logging]` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `false` installs no subscriber.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path (if output is "file"); defaults to the XDG data directory
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// ANSI colors for text output; never applied to files.
    #[serde(default = "default_true")]
    pub color: bool,

    /// Per-module levels, e.g. `sheetsmith::generation = "debug"`.
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

/// Resolve the log file path: explicit CLI path, then config, then `<data dir>/sheetsmith.log`.
pub fn resolve_log_file_path(
    cli_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    workspace_root: Option<&Path>,
) -> Result<PathBuf, ApiError> {
    if let Some(path) = cli_path.or(config_path) {
        return Ok(path);
    }
    if let Some(dirs) = directories::ProjectDirs::from("", "", "sheetsmith") {
        return Ok(dirs.data_dir().join("sheetsmith.log"));
    }
    workspace_root
        .map(|root| root.join(".sheetsmith").join("sheetsmith.log"))
        .ok_or_else(|| ApiError::ConfigError("Unable to resolve a log file path".to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Stdout,
    Stderr,
    File,
}

/// Settings after `SHEETSMITH_LOG_*` environment overrides are applied.
struct Resolved {
    filter: EnvFilter,
    format: Format,
    output: Output,
    color: bool,
}

impl Resolved {
    fn from_config(config: Option<&LoggingConfig>) -> Result<Self, ApiError> {
        let format = match std::env::var("SHEETSMITH_LOG_FORMAT") {
            Ok(value) if matches!(value.as_str(), "json" | "text") => parse_format(&value)?,
            _ => parse_format(config.map_or("text", |c| c.format.as_str()))?,
        };
        let output = match std::env::var("SHEETSMITH_LOG_OUTPUT") {
            Ok(value) => parse_output(&value)?,
            Err(_) => parse_output(config.map_or("stderr", |c| c.output.as_str()))?,
        };
        Ok(Self {
            filter: build_env_filter(config)?,
            format,
            output,
            color: config.map_or(true, |c| c.color) && output != Output::File,
        })
    }
}

/// Install the global subscriber.
///
/// `SHEETSMITH_LOG`, `SHEETSMITH_LOG_FORMAT` and `SHEETSMITH_LOG_OUTPUT` win over `config`,
/// which the binary has already merged with its command-line flags.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), ApiError> {
    if config.is_some_and(|c| !c.enabled) {
        return Ok(());
    }

    let resolved = Resolved::from_config(config)?;
    let writer = match resolved.output {
        Output::Stdout => BoxMakeWriter::new(std::io::stdout),
        Output::Stderr => BoxMakeWriter::new(std::io::stderr),
        Output::File => {
            let path = resolve_log_file_path(None, config.and_then(|c| c.file.clone()), None)?;
            BoxMakeWriter::new(std::sync::Mutex::new(open_log_file(&path)?))
        }
    };

    let layer = fmt::layer()
        .with_target(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(writer);
    let registry = Registry::default().with(resolved.filter);
    let installed = match resolved.format {
        Format::Json => registry.with(layer.json()).try_init(),
        Format::Text => registry.with(layer.with_ansi(resolved.color)).try_init(),
    };
    installed.map_err(|e| ApiError::ConfigError(format!("Failed to install logger: {}", e)))
}

fn open_log_file(path: &Path) -> Result<std::fs::File, ApiError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ApiError::ConfigError(format!("Failed to create log directory: {}", e)))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ApiError::ConfigError(format!("Failed to open log file {}: {}", path.display(), e)))
}

/// Base level plus per-module directives from config and `SHEETSMITH_LOG_MODULES`
/// (`module=level,module=level`). A full `SHEETSMITH_LOG` filter replaces all of it.
fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, ApiError> {
    if let Ok(filter) = EnvFilter::try_from_env("SHEETSMITH_LOG") {
        return Ok(filter);
    }
    let level = config.map_or("info", |c| c.level.as_str());
    if level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut directives: Vec<String> = config
        .map(|c| {
            c.modules
                .iter()
                .map(|(module, lvl)| format!("{}={}", module, lvl))
                .collect()
        })
        .unwrap_or_default();
    if let Ok(spec) = std::env::var("SHEETSMITH_LOG_MODULES") {
        directives.extend(spec.split(',').filter_map(|pair| {
            let (module, lvl) = pair.split_once('=')?;
            Some(format!("{}={}", module.trim(), lvl.trim()))
        }));
    }

    directives.iter().try_fold(EnvFilter::new(level), |filter, directive| {
        let parsed = directive.parse().map_err(|e| {
            ApiError::ConfigError(format!("Invalid log directive '{}': {}", directive, e))
        })?;
        Ok(filter.add_directive(parsed))
    })
}

fn parse_format(format: &str) -> Result<Format, ApiError> {
    match format {
        "json" => Ok(Format::Json),
        "text" => Ok(Format::Text),
        other => Err(ApiError::ConfigError(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            other
        ))),
    }
}

fn parse_output(output: &str) -> Result<Output, ApiError> {
    match output {
        "stdout" => Ok(Output::Stdout),
        "stderr" => Ok(Output::Stderr),
        "file" => Ok(Output::File),
        other => Err(ApiError::ConfigError(format!(
            "Invalid log output: {} (must be 'stdout', 'stderr' or 'file')",
            other
        ))),
    }
}
