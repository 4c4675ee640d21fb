//! Sheet presentation: import, validate, status, list, recover.

use super::shared::{
    format_section_heading, format_timestamp_ms, frame_status_label, sheet_status_label,
    to_pretty_json,
};
use crate::error::ApiError;
use crate::sheet::SpriteSheet;
use crate::validation::ValidationReport;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;

pub fn format_validation_report(report: &ValidationReport, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_pretty_json(report);
    }
    if report.valid {
        return Ok("Sheet definition is valid.".to_string());
    }
    let mut out = format!("Sheet definition is invalid ({} problems):", report.errors.len());
    for error in &report.errors {
        out.push_str(&format!("\n  - {}", error));
    }
    Ok(out)
}

pub fn format_import_result(sheet: &SpriteSheet, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_pretty_json(&serde_json::json!({
            "sheet_id": sheet.id,
            "name": sheet.name,
            "rows": sheet.dimensions.rows,
            "cols": sheet.dimensions.cols,
            "frames": sheet.frames.len(),
        }));
    }
    Ok(format!(
        "Imported sheet {} ({}x{}, {} frames)",
        sheet.id,
        sheet.dimensions.rows,
        sheet.dimensions.cols,
        sheet.frames.len()
    ))
}

/// Sheet summary plus a per-frame table in row-major order.
pub fn format_sheet_status(sheet: &SpriteSheet, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_pretty_json(sheet);
    }

    let progress = &sheet.generation_progress;
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading(&format!("Sheet {}", sheet.id))
    ));
    if let Some(name) = &sheet.name {
        out.push_str(&format!("  Name: {}\n", name));
    }
    out.push_str(&format!("  Status: {}\n", sheet_status_label(sheet.status)));
    out.push_str(&format!(
        "  Progress: {}/{} frames completed\n",
        progress.completed_frames, progress.total_frames
    ));
    if let Some(run) = &sheet.active_run {
        out.push_str(&format!(
            "  Active run: {} (started {})\n",
            run.run_id,
            format_timestamp_ms(run.started_at_ms)
        ));
    }
    if let Some(url) = &sheet.final_image_url {
        out.push_str(&format!("  Sheet image: {}\n", url));
    }
    if let Some(error) = &sheet.composite_error {
        out.push_str(&format!("  Composite error: {}\n", error));
    }
    out.push('\n');

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Frame", "Row", "Col", "Status", "Detail"]);
    for frame in sheet.frames_row_major() {
        let detail = frame
            .error_message
            .clone()
            .or_else(|| frame.image_ref.clone())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            frame.id.clone(),
            frame.position.row.to_string(),
            frame.position.col.to_string(),
            frame_status_label(frame.status),
            detail,
        ]);
    }
    out.push_str(&format!("{}\n", table));
    Ok(out)
}

pub fn format_sheet_list(sheets: &[SpriteSheet], format: &str) -> Result<String, ApiError> {
    if format == "json" {
        let rows: Vec<serde_json::Value> = sheets
            .iter()
            .map(|s| {
                serde_json::json!({
                    "sheet_id": s.id,
                    "name": s.name,
                    "status": s.status,
                    "completed_frames": s.generation_progress.completed_frames,
                    "total_frames": s.generation_progress.total_frames,
                })
            })
            .collect();
        return to_pretty_json(&rows);
    }
    if sheets.is_empty() {
        return Ok("No sheets stored.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Sheet", "Name", "Grid", "Status", "Progress", "Updated"]);
    for sheet in sheets {
        table.add_row(vec![
            sheet.id.clone(),
            sheet.name.clone().unwrap_or_else(|| "-".to_string()),
            format!("{}x{}", sheet.dimensions.rows, sheet.dimensions.cols),
            sheet_status_label(sheet.status),
            format!(
                "{}/{}",
                sheet.generation_progress.completed_frames, sheet.generation_progress.total_frames
            ),
            format_timestamp_ms(sheet.updated_at_ms),
        ]);
    }
    Ok(table.to_string())
}

pub fn format_recover_result(frames: usize) -> String {
    match frames {
        0 => "Nothing to recover.".to_string(),
        1 => "Recovered 1 interrupted frame.".to_string(),
        n => format!("Recovered {} interrupted frames.", n),
    }
}
