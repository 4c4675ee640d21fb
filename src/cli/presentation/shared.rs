//! Shared presentation helpers: headings, status colors, json encoding.

use crate::error::{ApiError, StorageError};
use crate::sheet::{FrameStatus, SheetStatus};
use chrono::{DateTime, SecondsFormat};
use owo_colors::OwoColorize;
use serde::Serialize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::StorageError(StorageError::Serialization(e.to_string())))
}

/// RFC 3339 UTC rendering of a millisecond timestamp.
pub(super) fn format_timestamp_ms(ms: u64) -> String {
    DateTime::from_timestamp_millis(ms as i64)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "-".to_string())
}

pub(super) fn sheet_status_label(status: SheetStatus) -> String {
    let label = status.as_str();
    match status {
        SheetStatus::Completed => label.green().to_string(),
        SheetStatus::Error => label.red().to_string(),
        SheetStatus::Generating => label.yellow().to_string(),
        SheetStatus::Draft => label.dimmed().to_string(),
    }
}

pub(super) fn frame_status_label(status: FrameStatus) -> String {
    let label = status.as_str();
    match status {
        FrameStatus::Completed => label.green().to_string(),
        FrameStatus::Error => label.red().to_string(),
        FrameStatus::Generating => label.yellow().to_string(),
        FrameStatus::Pending => label.dimmed().to_string(),
    }
}
