//! CLI command-name contract for logging and routing.

use crate::cli::parse::Commands;

/// Command name string for log fields (e.g. "generate", "status").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Import { .. } => "import",
        Commands::Validate { .. } => "validate",
        Commands::Generate { .. } => "generate",
        Commands::Status { .. } => "status",
        Commands::List { .. } => "list",
        Commands::Recover => "recover",
    }
}

/// Sheet id targeted by a command, if any.
pub fn command_sheet_id(command: &Commands) -> Option<&str> {
    match command {
        Commands::Generate { sheet_id, .. } | Commands::Status { sheet_id, .. } => Some(sheet_id),
        _ => None,
    }
}
