//! Frame status persistence.
//!
//! Every write is load, mutate, recompute aggregate, store, under one lock so concurrent
//! frames of a batch never lose each other's updates.

use crate::error::{ApiError, StorageError};
use crate::generation::aggregator::SheetAggregator;
use crate::sheet::{ActiveRun, FrameStatus, FrameUpdate, SpriteSheet};
use crate::storage::SheetStore;
use crate::types::{FrameId, RunId};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

pub const INTERRUPTED_MESSAGE: &str = "generation interrupted";
pub const STATUS_WRITE_LOST_MESSAGE: &str = "frame result could not be recorded";

pub struct FrameStateStore {
    store: Arc<dyn SheetStore>,
    write_lock: Mutex<()>,
}

impl FrameStateStore {
    pub fn new(store: Arc<dyn SheetStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn SheetStore> {
        &self.store
    }

    pub fn load(&self, sheet_id: &str) -> Result<SpriteSheet, StorageError> {
        self.store.require_sheet(sheet_id)
    }

    /// Persist a whole sheet record with a freshly derived aggregate.
    pub fn save(&self, sheet: &mut SpriteSheet) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        SheetAggregator::recompute(sheet);
        self.store.put_sheet(sheet)
    }

    /// Change one frame's status. Returns the sheet as written.
    pub fn set_status(
        &self,
        sheet_id: &str,
        frame_id: &str,
        status: FrameStatus,
        update: FrameUpdate,
    ) -> Result<SpriteSheet, StorageError> {
        self.mutate(sheet_id, |sheet| {
            let frame = sheet
                .frame_mut(frame_id)
                .ok_or_else(|| StorageError::FrameNotFound {
                    sheet_id: sheet_id.to_string(),
                    frame_id: frame_id.to_string(),
                })?;
            frame.transition(status, update)
        })
    }

    /// Mark a run as active. Refuses if another run already holds the sheet.
    pub fn begin_run(
        &self,
        sheet_id: &str,
        run_id: &RunId,
        target_frames: Vec<FrameId>,
        started_at_ms: u64,
    ) -> Result<SpriteSheet, ApiError> {
        let _guard = self.write_lock.lock();
        let mut sheet = self.store.require_sheet(sheet_id)?;
        if sheet.active_run.is_some() {
            return Err(ApiError::GenerationInProgress(sheet_id.to_string()));
        }
        sheet.active_run = Some(ActiveRun {
            run_id: run_id.clone(),
            started_at_ms,
            target_frames,
        });
        // A new run invalidates the previous composite outcome
        sheet.final_image_url = None;
        sheet.composite_error = None;
        SheetAggregator::recompute(&mut sheet);
        self.store.put_sheet(&sheet)?;
        Ok(sheet)
    }

    /// Close a run: record the composite outcome and clear the active-run marker.
    ///
    /// Any of the run's targets still `generating` (a lost status write) become `error`, so a
    /// finished run never leaves a frame in flight.
    pub fn finish_run(
        &self,
        sheet_id: &str,
        run_id: &str,
        final_image_url: Option<String>,
        composite_error: Option<String>,
    ) -> Result<SpriteSheet, StorageError> {
        self.mutate(sheet_id, |sheet| {
            let targets = match &sheet.active_run {
                Some(run) if run.run_id == run_id => run.target_frames.clone(),
                _ => Vec::new(),
            };
            for frame_id in &targets {
                if let Some(frame) = sheet.frame_mut(frame_id) {
                    if frame.status == FrameStatus::Generating {
                        warn!(sheet_id, frame_id = %frame_id, "Frame still generating at end of run");
                        frame.transition(
                            FrameStatus::Error,
                            FrameUpdate::failed(STATUS_WRITE_LOST_MESSAGE, None),
                        )?;
                    }
                }
            }
            sheet.final_image_url = final_image_url;
            sheet.composite_error = composite_error;
            if matches!(&sheet.active_run, Some(run) if run.run_id == run_id) {
                sheet.active_run = None;
            }
            Ok(())
        })
    }

    /// Repair one sheet left mid-run by a process that died: `generating` frames become
    /// `error` and the active-run marker is dropped. Returns the number of frames changed.
    pub fn recover_sheet(&self, sheet_id: &str) -> Result<usize, StorageError> {
        let mut changed = 0usize;
        let mut touched = false;
        self.mutate(sheet_id, |sheet| {
            for frame in sheet.frames.iter_mut() {
                if frame.status == FrameStatus::Generating {
                    frame.transition(
                        FrameStatus::Error,
                        FrameUpdate::failed(INTERRUPTED_MESSAGE, None),
                    )?;
                    changed += 1;
                }
            }
            touched = sheet.active_run.take().is_some() || changed > 0;
            Ok(())
        })?;
        if touched {
            info!(sheet_id, frames = changed, "Recovered interrupted sheet");
        }
        Ok(changed)
    }

    /// Recover every stored sheet. Only safe when no run is executing in this process.
    pub fn recover_interrupted(&self) -> Result<usize, StorageError> {
        let mut changed = 0usize;
        for sheet in self.store.list_sheets()? {
            if needs_recovery(&sheet) {
                changed += self.recover_sheet(&sheet.id)?;
            }
        }
        Ok(changed)
    }

    fn mutate<F>(&self, sheet_id: &str, f: F) -> Result<SpriteSheet, StorageError>
    where
        F: FnOnce(&mut SpriteSheet) -> Result<(), StorageError>,
    {
        let _guard = self.write_lock.lock();
        let mut sheet = self.store.require_sheet(sheet_id)?;
        f(&mut sheet)?;
        SheetAggregator::recompute(&mut sheet);
        self.store.put_sheet(&sheet)?;
        Ok(sheet)
    }
}

pub fn needs_recovery(sheet: &SpriteSheet) -> bool {
    sheet.active_run.is_some() || sheet.count_with_status(FrameStatus::Generating) > 0
}
