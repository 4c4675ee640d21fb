//! Shared identifier types and time helpers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Identifier of a sprite sheet record.
pub type SheetId = String;

/// Identifier of a single frame within a sheet.
pub type FrameId = String;

/// Identifier of one generation run against a sheet.
pub type RunId = String;

pub fn new_sheet_id() -> SheetId {
    uuid::Uuid::new_v4().to_string()
}

pub fn new_run_id() -> RunId {
    format!("run-{}", uuid::Uuid::new_v4().simple())
}

/// Deterministic frame id for a grid cell, used when a sheet definition omits ids.
pub fn frame_id_for(row: u32, col: u32) -> FrameId {
    format!("frame-{row}-{col}")
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Short hex digest of arbitrary bytes (first 8 bytes of blake3).
pub fn short_digest(bytes: &[u8]) -> String {
    let hash = blake3::hash(bytes);
    hex::encode(&hash.as_bytes()[..8])
}
