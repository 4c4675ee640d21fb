//! Sprite sheet record: fixed grid, owned frames, derived status and progress.

use crate::sheet::character::BaseCharacter;
use crate::sheet::frame::{Frame, FrameProperties, FrameStatus, Position};
use crate::types::{frame_id_for, new_sheet_id, now_millis, FrameId, RunId, SheetId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub rows: u32,
    pub cols: u32,
}

pub const MIN_GRID: u32 = 1;
pub const MAX_GRID: u32 = 20;

impl Dimensions {
    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    pub fn within_limits(&self) -> bool {
        (MIN_GRID..=MAX_GRID).contains(&self.rows) && (MIN_GRID..=MAX_GRID).contains(&self.cols)
    }
}

/// One pending frame per cell, row-major. Empty when the grid is out of limits, so an
/// oversized definition reaches validation instead of allocating.
fn default_grid(dimensions: Dimensions) -> Vec<Frame> {
    if !dimensions.within_limits() {
        return Vec::new();
    }
    (0..dimensions.rows)
        .flat_map(|row| (0..dimensions.cols).map(move |col| (row, col)))
        .map(|(row, col)| {
            Frame::new(
                frame_id_for(row, col),
                Position::new(row, col),
                FrameProperties::default(),
            )
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

/// Layout of the composite image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Transparent gap between adjacent cells, in pixels.
    #[serde(default)]
    pub spacing: u32,
    /// Transparent margin around the whole grid, in pixels.
    #[serde(default)]
    pub border: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetStatus {
    Draft,
    Generating,
    Completed,
    Error,
}

impl SheetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SheetStatus::Draft => "draft",
            SheetStatus::Generating => "generating",
            SheetStatus::Completed => "completed",
            SheetStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationProgress {
    pub completed_frames: usize,
    pub total_frames: usize,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Marker for a run currently dispatching against the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveRun {
    pub run_id: RunId,
    pub started_at_ms: u64,
    pub target_frames: Vec<FrameId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteSheet {
    pub id: SheetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub base_character: BaseCharacter,
    pub dimensions: Dimensions,
    pub frame_size: FrameSize,
    #[serde(default)]
    pub output_settings: OutputSettings,
    pub frames: Vec<Frame>,
    #[serde(default = "default_sheet_status")]
    pub status: SheetStatus,
    #[serde(default)]
    pub generation_progress: GenerationProgress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_run: Option<ActiveRun>,
    #[serde(default)]
    pub created_at_ms: u64,
    #[serde(default)]
    pub updated_at_ms: u64,
}

fn default_sheet_status() -> SheetStatus {
    SheetStatus::Draft
}

impl SpriteSheet {
    /// Create a draft sheet with `rows x cols` pending frames in row-major order.
    pub fn new(
        id: SheetId,
        base_character: BaseCharacter,
        dimensions: Dimensions,
        frame_size: FrameSize,
    ) -> Self {
        Self::with_frames(id, base_character, dimensions, frame_size, default_grid(dimensions))
    }

    fn with_frames(
        id: SheetId,
        base_character: BaseCharacter,
        dimensions: Dimensions,
        frame_size: FrameSize,
        frames: Vec<Frame>,
    ) -> Self {
        let now = now_millis();
        Self {
            id,
            name: None,
            base_character,
            dimensions,
            frame_size,
            output_settings: OutputSettings::default(),
            frames,
            status: SheetStatus::Draft,
            generation_progress: GenerationProgress {
                completed_frames: 0,
                total_frames: dimensions.cell_count(),
                errors: Vec::new(),
            },
            final_image_url: None,
            composite_error: None,
            active_run: None,
            created_at_ms: now,
            updated_at_ms: now,
        }
    }

    pub fn total_frames(&self) -> usize {
        self.dimensions.cell_count()
    }

    pub fn frame(&self, frame_id: &str) -> Option<&Frame> {
        self.frames.iter().find(|f| f.id == frame_id)
    }

    pub fn frame_mut(&mut self, frame_id: &str) -> Option<&mut Frame> {
        self.frames.iter_mut().find(|f| f.id == frame_id)
    }

    pub fn count_with_status(&self, status: FrameStatus) -> usize {
        self.frames.iter().filter(|f| f.status == status).count()
    }

    pub fn all_frames_completed(&self) -> bool {
        !self.frames.is_empty() && self.frames.iter().all(|f| f.status == FrameStatus::Completed)
    }

    /// Frames sorted by `(row, col)`.
    pub fn frames_row_major(&self) -> Vec<&Frame> {
        let mut frames: Vec<&Frame> = self.frames.iter().collect();
        frames.sort_by_key(|f| f.position);
        frames
    }
}

/// Frame entry of a sheet definition file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameDefinition {
    #[serde(default)]
    pub id: Option<FrameId>,
    pub position: Position,
    #[serde(default)]
    pub properties: FrameProperties,
}

/// User-authored sheet definition, as produced by a setup flow.
///
/// When `frames` is empty, one pending frame per grid cell is created (none if the grid
/// is out of limits).
/// Explicit frames are taken verbatim so a wrong count is caught by validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetDefinition {
    #[serde(default)]
    pub id: Option<SheetId>,
    #[serde(default)]
    pub name: Option<String>,
    pub base_character: BaseCharacter,
    pub dimensions: Dimensions,
    pub frame_size: FrameSize,
    #[serde(default)]
    pub output_settings: OutputSettings,
    #[serde(default)]
    pub frames: Vec<FrameDefinition>,
}

impl SheetDefinition {
    pub fn into_sheet(self) -> SpriteSheet {
        let id = self.id.unwrap_or_else(new_sheet_id);
        let frames = if self.frames.is_empty() {
            default_grid(self.dimensions)
        } else {
            self.frames
                .into_iter()
                .map(|def| {
                    let id = def
                        .id
                        .unwrap_or_else(|| frame_id_for(def.position.row, def.position.col));
                    Frame::new(id, def.position, def.properties)
                })
                .collect()
        };
        let mut sheet = SpriteSheet::with_frames(
            id,
            self.base_character,
            self.dimensions,
            self.frame_size,
            frames,
        );
        sheet.name = self.name;
        sheet.output_settings = self.output_settings;
        sheet
    }
}
