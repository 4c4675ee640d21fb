//! CLI domain: parse, route, help, output, and presentation only.
//! No generation logic; the single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::{command_name, command_sheet_id};
pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_generation_ack, format_generation_result, format_import_result, format_recover_result,
    format_section_heading, format_sheet_list, format_sheet_status, format_validation_report,
    to_pretty_json,
};
pub use route::RunContext;
