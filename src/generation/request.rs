//! Request, result and report types of a generation run.

use crate::config::GenerationSettings;
use crate::error::GenerationError;
use crate::sheet::{GenerationProgress, Position, SheetStatus, SpriteSheet, WorldStyle};
use crate::types::{FrameId, RunId, SheetId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Quality,
    Speed,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Quality => "quality",
            Priority::Speed => "speed",
        }
    }

    pub fn default_batch_size(self, settings: &GenerationSettings) -> usize {
        match self {
            Priority::Quality => settings.quality_batch_size,
            Priority::Speed => settings.speed_batch_size,
        }
    }

    pub fn estimated_secs_per_frame(self, settings: &GenerationSettings) -> u64 {
        match self {
            Priority::Quality => settings.estimated_secs_per_frame_quality,
            Priority::Speed => settings.estimated_secs_per_frame_speed,
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quality" => Ok(Priority::Quality),
            "speed" => Ok(Priority::Speed),
            other => Err(format!("unknown priority '{other}' (expected quality or speed)")),
        }
    }
}

/// The sheet a request runs against: a stored record, or a full sheet passed by value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetRef {
    Id(SheetId),
    Inline(Box<SpriteSheet>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub sprite_sheet: SheetRef,
    /// Subset of frame ids; absent means every `pending` or `error` frame.
    #[serde(default)]
    pub frames_to_generate: Option<Vec<FrameId>>,
    #[serde(default)]
    pub world_style: Option<WorldStyle>,
    #[serde(default)]
    pub priority: Priority,
    /// Overrides the priority's default batch size.
    #[serde(default)]
    pub batch_size: Option<usize>,
}

impl GenerationRequest {
    pub fn for_sheet(sheet_id: impl Into<SheetId>) -> Self {
        Self {
            sprite_sheet: SheetRef::Id(sheet_id.into()),
            frames_to_generate: None,
            world_style: None,
            priority: Priority::default(),
            batch_size: None,
        }
    }

    pub fn inline(sheet: SpriteSheet) -> Self {
        Self {
            sprite_sheet: SheetRef::Inline(Box::new(sheet)),
            ..Self::for_sheet(String::new())
        }
    }

    pub fn with_frames(mut self, frames: Vec<FrameId>) -> Self {
        self.frames_to_generate = Some(frames);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_world_style(mut self, style: WorldStyle) -> Self {
        self.world_style = Some(style);
        self
    }

    pub fn sheet_id(&self) -> &str {
        match &self.sprite_sheet {
            SheetRef::Id(id) => id,
            SheetRef::Inline(sheet) => &sheet.id,
        }
    }

    pub fn resolve_batch_size(&self, settings: &GenerationSettings) -> usize {
        self.batch_size
            .unwrap_or_else(|| self.priority.default_batch_size(settings))
    }
}

/// Where a successfully generated frame image was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    pub mime_type: String,
    pub duration_ms: u64,
}

/// Result of one dispatched frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameOutcome {
    pub frame_id: FrameId,
    pub position: Position,
    pub batch_index: usize,
    pub result: Result<ImageRef, GenerationError>,
}

impl FrameOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// `frame {id} (row r, col c): message`, or `None` on success.
    pub fn error_line(&self) -> Option<String> {
        self.result
            .as_ref()
            .err()
            .map(|e| format!("frame {} ({}): {}", self.frame_id, self.position, e))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub total_generation_time_ms: u64,
    pub avg_time_per_frame_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub sheet_id: SheetId,
    pub run_id: RunId,
    pub generated_frames: usize,
    pub failed_frames: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_sprite_sheet_url: Option<String>,
    pub errors: Vec<String>,
    pub metadata: GenerationMetadata,
    /// Sheet status after the run.
    pub status: SheetStatus,
    #[serde(default)]
    pub cancelled: bool,
    /// Targeted frames never dispatched because the run was cancelled.
    #[serde(default)]
    pub skipped_frames: Vec<FrameId>,
}

/// Acknowledgement returned when a background run is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationAck {
    pub sheet_id: SheetId,
    pub run_id: RunId,
    pub frames_queued: usize,
    pub estimated_seconds: u64,
}

/// Pollable view of a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetStatusReport {
    pub sheet_id: SheetId,
    pub status: SheetStatus,
    pub generation_progress: GenerationProgress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_run_id: Option<RunId>,
}

impl From<&SpriteSheet> for SheetStatusReport {
    fn from(sheet: &SpriteSheet) -> Self {
        Self {
            sheet_id: sheet.id.clone(),
            status: sheet.status,
            generation_progress: sheet.generation_progress.clone(),
            final_image_url: sheet.final_image_url.clone(),
            composite_error: sheet.composite_error.clone(),
            active_run_id: sheet.active_run.as_ref().map(|r| r.run_id.clone()),
        }
    }
}

/// Rough wall-clock estimate for `frames` targets: one per-frame estimate per batch plus pacing.
pub fn estimate_seconds(
    frames: usize,
    batch_size: usize,
    priority: Priority,
    settings: &GenerationSettings,
) -> u64 {
    if frames == 0 || batch_size == 0 {
        return 0;
    }
    let batches = frames.div_ceil(batch_size) as u64;
    let pacing_ms = settings.pacing_ms * (batches - 1);
    batches * priority.estimated_secs_per_frame(settings) + pacing_ms.div_ceil(1000)
}
