//! Sheet-level status and progress, derived from frame statuses.
//!
//! Everything here is recomputed from the full frame set on every call; nothing is patched
//! incrementally.

use crate::sheet::{FrameStatus, GenerationProgress, SheetStatus, SpriteSheet};

pub struct SheetAggregator;

impl SheetAggregator {
    pub fn progress(sheet: &SpriteSheet) -> GenerationProgress {
        let errors = sheet
            .frames_row_major()
            .into_iter()
            .filter(|f| f.status == FrameStatus::Error)
            .map(|f| {
                format!(
                    "frame {} ({}): {}",
                    f.id,
                    f.position,
                    f.error_message.as_deref().unwrap_or("unknown error")
                )
            })
            .collect();
        GenerationProgress {
            completed_frames: sheet.count_with_status(FrameStatus::Completed),
            total_frames: sheet.total_frames(),
            errors,
        }
    }

    /// Sheet status, in precedence order:
    ///
    /// 1. `generating` while a run is active or any frame is `generating`
    /// 2. `error` if any frame failed or composite assembly failed
    /// 3. `completed` if every frame is `completed` and the composite exists
    /// 4. `draft` otherwise
    ///
    /// `draft` is derived from frames, not history: after a clean partial run that leaves
    /// other frames `pending`, the sheet reads `draft` again. Sheets carry no "ever ran" flag.
    pub fn status(sheet: &SpriteSheet) -> SheetStatus {
        if sheet.active_run.is_some() || sheet.count_with_status(FrameStatus::Generating) > 0 {
            SheetStatus::Generating
        } else if sheet.count_with_status(FrameStatus::Error) > 0 || sheet.composite_error.is_some()
        {
            SheetStatus::Error
        } else if sheet.all_frames_completed() && sheet.final_image_url.is_some() {
            SheetStatus::Completed
        } else {
            SheetStatus::Draft
        }
    }

    pub fn recompute(sheet: &mut SpriteSheet) {
        sheet.generation_progress = Self::progress(sheet);
        sheet.status = Self::status(sheet);
    }

    /// Whether composite assembly should run after a run's dispatch finished.
    pub fn should_composite(
        sheet: &SpriteSheet,
        target_count: usize,
        generated: usize,
        failed: usize,
    ) -> bool {
        failed == 0 && generated == target_count && sheet.all_frames_completed()
    }
}
