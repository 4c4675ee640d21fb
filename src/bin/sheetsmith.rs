//! `sheetsmith` command-line entry point.

use clap::Parser;
use sheetsmith::cli::{map_error, Cli, RunContext};
use sheetsmith::config::ConfigLoader;
use sheetsmith::error::ApiError;
use sheetsmith::logging::{init_logging, resolve_log_file_path, LoggingConfig};
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(Some(&build_logging_config(&cli))) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }
    info!(workspace = %cli.workspace.display(), "sheetsmith starting");

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "sheetsmith failed");
            eprintln!("{}", map_error(&e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String, ApiError> {
    RunContext::new(cli.workspace.clone(), cli.config.clone())?.execute(&cli.command)
}

/// Logging settings from the config file with command-line flags on top.
/// An unreadable config falls back to defaults here; `run` reports the real error.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let loaded = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(&cli.workspace),
    };
    let mut config = loaded.map(|c| c.logging).unwrap_or_default();

    config.enabled &= !cli.quiet;
    if cli.verbose {
        config.level = "debug".to_string();
    }
    for (flag, field) in [
        (&cli.log_level, &mut config.level),
        (&cli.log_format, &mut config.format),
        (&cli.log_output, &mut config.output),
    ] {
        if let Some(value) = flag {
            *field = value.clone();
        }
    }

    if config.enabled && config.output == "file" {
        config.file = resolve_log_file_path(
            cli.log_file.clone(),
            config.file.take(),
            Some(cli.workspace.as_path()),
        )
        .ok();
    } else if cli.log_file.is_some() {
        config.file = cli.log_file.clone();
    }
    config
}
