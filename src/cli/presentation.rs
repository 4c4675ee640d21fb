//! CLI presentation: text and json formatters per command family.

mod generation;
mod shared;
mod sheet;

pub use generation::{format_generation_ack, format_generation_result};
pub use shared::{format_section_heading, to_pretty_json};
pub use sheet::{
    format_import_result, format_recover_result, format_sheet_list, format_sheet_status,
    format_validation_report,
};
