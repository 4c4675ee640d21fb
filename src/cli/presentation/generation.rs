//! Generation presentation: acknowledgement and run result.

use super::shared::{sheet_status_label, to_pretty_json};
use crate::error::ApiError;
use crate::generation::{GenerationAck, GenerationResult};

pub fn format_generation_ack(ack: &GenerationAck) -> String {
    format!(
        "Started {} for sheet {}: {} frames queued (estimated {}s)",
        ack.run_id, ack.sheet_id, ack.frames_queued, ack.estimated_seconds
    )
}

pub fn format_generation_result(result: &GenerationResult, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_pretty_json(result);
    }
    let mut out = format!(
        "Run {} finished: {} generated, {} failed, status {}",
        result.run_id,
        result.generated_frames,
        result.failed_frames,
        sheet_status_label(result.status)
    );
    out.push_str(&format!(
        "\n  Time: {}ms total, {}ms per frame",
        result.metadata.total_generation_time_ms, result.metadata.avg_time_per_frame_ms
    ));
    if let Some(url) = &result.final_sprite_sheet_url {
        out.push_str(&format!("\n  Sheet image: {}", url));
    }
    if result.cancelled {
        out.push_str(&format!(
            "\n  Cancelled; {} frames not dispatched",
            result.skipped_frames.len()
        ));
    }
    if !result.errors.is_empty() {
        out.push_str(&format!("\n\nErrors ({}):", result.errors.len()));
        for error in &result.errors {
            out.push_str(&format!("\n  - {}", error));
        }
    }
    Ok(out)
}
