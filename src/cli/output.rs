//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map domain/service errors to a string for CLI output.
/// Validation failures are listed one per line.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::Validation(errors) => {
            let mut out = format!("Validation failed ({} problems):", errors.len());
            for error in errors {
                out.push_str(&format!("\n  - {}", error));
            }
            out
        }
        other => other.to_string(),
    }
}
