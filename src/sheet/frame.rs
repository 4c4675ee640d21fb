//! Frames: one grid cell of a sheet, its per-frame overrides and its status machine.

use crate::error::StorageError;
use crate::types::{FrameId, RunId};
use serde::{Deserialize, Serialize};

/// 0-indexed grid position; row-major ordering is canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: u32,
    pub col: u32,
}

impl Position {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}, col {}", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyPriority {
    High,
    Medium,
    Low,
}

impl ConsistencyPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            ConsistencyPriority::High => "high",
            ConsistencyPriority::Medium => "medium",
            ConsistencyPriority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorVariants {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hair_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eye_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_priority: Option<ConsistencyPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_emphasis: Option<String>,
}

/// Per-frame overrides. Every field is optional; absence means "inherit, omit from prompt".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eye_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouth_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clothing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outfit_variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hairstyle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_pose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing_direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leg_position: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub special_effects: Vec<String>,
    #[serde(default)]
    pub color_variants: ColorVariants,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_modifiers: Vec<String>,
    #[serde(default)]
    pub generation_hints: GenerationHints,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStatus {
    Pending,
    Generating,
    Completed,
    Error,
}

impl FrameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FrameStatus::Pending => "pending",
            FrameStatus::Generating => "generating",
            FrameStatus::Completed => "completed",
            FrameStatus::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FrameStatus::Completed | FrameStatus::Error)
    }
}

/// Timing and debug information recorded for the latest generation attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameGenerationMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_digest: Option<String>,
}

/// Payload accompanying a status change.
#[derive(Debug, Clone, Default)]
pub struct FrameUpdate {
    pub image_ref: Option<String>,
    pub error_message: Option<String>,
    pub metadata: Option<FrameGenerationMetadata>,
}

impl FrameUpdate {
    pub fn completed(image_ref: String, metadata: FrameGenerationMetadata) -> Self {
        Self {
            image_ref: Some(image_ref),
            error_message: None,
            metadata: Some(metadata),
        }
    }

    pub fn failed(message: impl Into<String>, metadata: Option<FrameGenerationMetadata>) -> Self {
        Self {
            image_ref: None,
            error_message: Some(message.into()),
            metadata,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub id: FrameId,
    pub position: Position,
    #[serde(default)]
    pub properties: FrameProperties,
    #[serde(default = "default_status")]
    pub status: FrameStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_metadata: Option<FrameGenerationMetadata>,
}

fn default_status() -> FrameStatus {
    FrameStatus::Pending
}

impl Frame {
    pub fn new(id: FrameId, position: Position, properties: FrameProperties) -> Self {
        Self {
            id,
            position,
            properties,
            status: FrameStatus::Pending,
            image_ref: None,
            error_message: None,
            generation_metadata: None,
        }
    }

    /// Apply a status change, enforcing the frame state machine:
    ///
    /// - `pending | error | completed -> generating`
    /// - `generating -> completed` (requires an image reference)
    /// - `pending | generating -> error` (requires an error message)
    ///
    /// Exactly one of `image_ref` / `error_message` is populated once the frame is terminal.
    pub fn transition(&mut self, to: FrameStatus, update: FrameUpdate) -> Result<(), StorageError> {
        use FrameStatus::*;

        match (self.status, to) {
            (Pending | Error | Completed, Generating) => {
                self.image_ref = None;
                self.error_message = None;
            }
            (Generating, Completed) => {
                let image_ref = update
                    .image_ref
                    .filter(|r| !r.trim().is_empty())
                    .ok_or_else(|| StorageError::InvalidUpdate {
                        frame_id: self.id.clone(),
                        reason: "completed frame requires an image reference".to_string(),
                    })?;
                self.image_ref = Some(image_ref);
                self.error_message = None;
            }
            (Pending | Generating, Error) => {
                let message = update
                    .error_message
                    .filter(|m| !m.trim().is_empty())
                    .ok_or_else(|| StorageError::InvalidUpdate {
                        frame_id: self.id.clone(),
                        reason: "failed frame requires an error message".to_string(),
                    })?;
                self.error_message = Some(message);
                self.image_ref = None;
            }
            (from, to) => {
                return Err(StorageError::InvalidTransition {
                    frame_id: self.id.clone(),
                    from: from.as_str(),
                    to: to.as_str(),
                });
            }
        }

        if let Some(metadata) = update.metadata {
            self.generation_metadata = Some(metadata);
        }
        self.status = to;
        Ok(())
    }
}
