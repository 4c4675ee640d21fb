//! Entry gate for generation requests.
//!
//! Runs before any external call. All problems are collected into one report rather than
//! failing on the first.

use crate::error::ApiError;
use crate::sheet::SpriteSheet;
use crate::types::FrameId;
pub use crate::sheet::{MAX_GRID, MIN_GRID};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const MIN_FRAME_PX: u32 = 16;
pub const MAX_FRAME_PX: u32 = 512;
pub const MAX_SPACING_PX: u32 = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.valid {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

/// Validate the shape of a sheet.
pub fn validate_sheet(sheet: &SpriteSheet) -> ValidationReport {
    ValidationReport::from_errors(sheet_errors(sheet))
}

/// Validate a sheet together with the run parameters of a generation request.
pub fn validate_request(
    sheet: &SpriteSheet,
    frames_to_generate: Option<&[FrameId]>,
    batch_size: Option<usize>,
) -> ValidationReport {
    let mut errors = sheet_errors(sheet);

    if batch_size == Some(0) {
        errors.push("batch_size must be at least 1".to_string());
    }

    if let Some(ids) = frames_to_generate {
        let known: HashSet<&str> = sheet.frames.iter().map(|f| f.id.as_str()).collect();
        for id in ids {
            if !known.contains(id.as_str()) {
                errors.push(format!("frames_to_generate references unknown frame '{id}'"));
            }
        }
    }

    ValidationReport::from_errors(errors)
}

fn sheet_errors(sheet: &SpriteSheet) -> Vec<String> {
    let mut errors = Vec::new();
    let dims = sheet.dimensions;
    let size = sheet.frame_size;

    if sheet.base_character.description.trim().is_empty() {
        errors.push("base_character.description must not be empty".to_string());
    }

    let rows_ok = (MIN_GRID..=MAX_GRID).contains(&dims.rows);
    let cols_ok = (MIN_GRID..=MAX_GRID).contains(&dims.cols);
    if !rows_ok {
        errors.push(format!(
            "dimensions.rows must be between {MIN_GRID} and {MAX_GRID} (got {})",
            dims.rows
        ));
    }
    if !cols_ok {
        errors.push(format!(
            "dimensions.cols must be between {MIN_GRID} and {MAX_GRID} (got {})",
            dims.cols
        ));
    }

    if !(MIN_FRAME_PX..=MAX_FRAME_PX).contains(&size.width) {
        errors.push(format!(
            "frame_size.width must be between {MIN_FRAME_PX} and {MAX_FRAME_PX} px (got {})",
            size.width
        ));
    }
    if !(MIN_FRAME_PX..=MAX_FRAME_PX).contains(&size.height) {
        errors.push(format!(
            "frame_size.height must be between {MIN_FRAME_PX} and {MAX_FRAME_PX} px (got {})",
            size.height
        ));
    }

    // Count only checked against a grid that is itself valid
    let expected = dims.cell_count();
    if rows_ok && cols_ok && sheet.frames.len() != expected {
        errors.push(format!(
            "frame count mismatch: expected {} (rows x cols = {} x {}), got {}",
            expected,
            dims.rows,
            dims.cols,
            sheet.frames.len()
        ));
    }

    if sheet.output_settings.spacing > MAX_SPACING_PX {
        errors.push(format!(
            "output_settings.spacing must be at most {MAX_SPACING_PX} px (got {})",
            sheet.output_settings.spacing
        ));
    }
    if sheet.output_settings.border > MAX_SPACING_PX {
        errors.push(format!(
            "output_settings.border must be at most {MAX_SPACING_PX} px (got {})",
            sheet.output_settings.border
        ));
    }

    let mut ids = HashSet::new();
    let mut positions = HashSet::new();
    for frame in &sheet.frames {
        if frame.id.trim().is_empty() {
            errors.push(format!("frame at ({}) has an empty id", frame.position));
        } else if !ids.insert(frame.id.as_str()) {
            errors.push(format!("duplicate frame id '{}'", frame.id));
        }
        if !positions.insert(frame.position) {
            errors.push(format!("duplicate frame position ({})", frame.position));
        }
        if rows_ok && cols_ok && (frame.position.row >= dims.rows || frame.position.col >= dims.cols)
        {
            errors.push(format!(
                "frame '{}' position ({}) is outside the {}x{} grid",
                frame.id, frame.position, dims.rows, dims.cols
            ));
        }
    }

    errors
}
