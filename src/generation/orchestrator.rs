//! Full generation run: validate, select targets, schedule, aggregate, composite.

use crate::config::GenerationSettings;
use crate::error::ApiError;
use crate::generation::aggregator::SheetAggregator;
use crate::generation::client::FrameGenerationClient;
use crate::generation::composite::CompositeAssembler;
use crate::generation::request::{
    estimate_seconds, GenerationAck, GenerationMetadata, GenerationRequest, GenerationResult,
    SheetRef,
};
use crate::generation::scheduler::{BatchScheduler, CancelFlag, RunTarget};
use crate::generation::state::FrameStateStore;
use crate::sheet::{Frame, FrameStatus, SpriteSheet};
use crate::types::{new_run_id, now_millis, FrameId};
use crate::validation::validate_request;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// A validated run whose active-run marker is already persisted.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub target: RunTarget,
    pub frames: Vec<Frame>,
    pub batch_size: usize,
    pub ack: GenerationAck,
}

pub struct GenerationOrchestrator {
    state: Arc<FrameStateStore>,
    scheduler: BatchScheduler,
    composite: Arc<dyn CompositeAssembler>,
    settings: GenerationSettings,
}

impl GenerationOrchestrator {
    pub fn new(
        state: Arc<FrameStateStore>,
        client: Arc<FrameGenerationClient>,
        composite: Arc<dyn CompositeAssembler>,
        settings: GenerationSettings,
    ) -> Self {
        let scheduler = BatchScheduler::new(client, Arc::clone(&state), settings.pacing());
        Self {
            state,
            scheduler,
            composite,
            settings,
        }
    }

    pub fn state(&self) -> &Arc<FrameStateStore> {
        &self.state
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Validate the request and claim the sheet. Makes no external call.
    pub fn prepare(&self, request: GenerationRequest) -> Result<PreparedRun, ApiError> {
        let batch_size = request.resolve_batch_size(&self.settings);
        let sheet = match request.sprite_sheet {
            SheetRef::Id(ref id) => self
                .state
                .store()
                .get_sheet(id)?
                .ok_or_else(|| ApiError::SheetNotFound(id.clone()))?,
            SheetRef::Inline(ref sheet) => sheet.as_ref().clone(),
        };

        validate_request(
            &sheet,
            request.frames_to_generate.as_deref(),
            Some(batch_size),
        )
        .into_result()?;

        if let SheetRef::Inline(_) = request.sprite_sheet {
            let stored = self.state.store().get_sheet(&sheet.id)?;
            if sheet.active_run.is_some() || stored.is_some_and(|s| s.active_run.is_some()) {
                return Err(ApiError::GenerationInProgress(sheet.id.clone()));
            }
            let mut inline = sheet.clone();
            self.state.save(&mut inline)?;
        }

        let frames = select_targets(&sheet, request.frames_to_generate.as_deref());
        let target_ids: Vec<FrameId> = frames.iter().map(|f| f.id.clone()).collect();
        let run_id = new_run_id();
        self.state
            .begin_run(&sheet.id, &run_id, target_ids, now_millis())?;

        let ack = GenerationAck {
            sheet_id: sheet.id.clone(),
            run_id: run_id.clone(),
            frames_queued: frames.len(),
            estimated_seconds: estimate_seconds(
                frames.len(),
                batch_size,
                request.priority,
                &self.settings,
            ),
        };

        info!(
            sheet_id = %sheet.id,
            run_id = %run_id,
            frames = frames.len(),
            batch_size,
            priority = request.priority.as_str(),
            "Run prepared"
        );

        Ok(PreparedRun {
            target: RunTarget {
                sheet_id: sheet.id,
                run_id,
                base_character: sheet.base_character,
                world_style: request.world_style,
            },
            frames,
            batch_size,
            ack,
        })
    }

    /// Dispatch a prepared run to completion (or cancellation) and close it out.
    pub async fn execute(
        &self,
        prepared: PreparedRun,
        cancel: &CancelFlag,
    ) -> Result<GenerationResult, ApiError> {
        let started = Instant::now();
        let PreparedRun {
            target,
            frames,
            batch_size,
            ..
        } = prepared;
        let target_count = frames.len();

        info!(
            sheet_id = %target.sheet_id,
            run_id = %target.run_id,
            frames = target_count,
            "Run started"
        );

        let report = self.scheduler.run(&target, frames, batch_size, cancel).await;
        let generated = report.generated();
        let failed = report.failed();

        let (final_url, composite_error) = if report.cancelled {
            (None, None)
        } else {
            self.assemble_if_complete(&target, target_count, generated, failed)
                .await
        };

        let sheet = self.state.finish_run(
            &target.sheet_id,
            &target.run_id,
            final_url.clone(),
            composite_error.clone(),
        )?;

        let mut errors: Vec<String> = report
            .outcomes
            .iter()
            .filter_map(|o| o.error_line())
            .collect();
        if let Some(message) = &composite_error {
            errors.push(format!("composite: {}", message));
        }

        let total_ms = started.elapsed().as_millis() as u64;
        let dispatched = report.outcomes.len() as u64;
        let result = GenerationResult {
            sheet_id: target.sheet_id.clone(),
            run_id: target.run_id.clone(),
            generated_frames: generated,
            failed_frames: failed,
            final_sprite_sheet_url: final_url,
            errors,
            metadata: GenerationMetadata {
                total_generation_time_ms: total_ms,
                avg_time_per_frame_ms: if dispatched == 0 { 0 } else { total_ms / dispatched },
            },
            status: sheet.status,
            cancelled: report.cancelled,
            skipped_frames: report.skipped,
        };

        info!(
            sheet_id = %result.sheet_id,
            run_id = %result.run_id,
            generated = result.generated_frames,
            failed = result.failed_frames,
            cancelled = result.cancelled,
            status = result.status.as_str(),
            total_ms,
            "Run completed"
        );
        Ok(result)
    }

    /// Prepare and execute in the caller's task.
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResult, ApiError> {
        let prepared = self.prepare(request)?;
        self.execute(prepared, &CancelFlag::new()).await
    }

    async fn assemble_if_complete(
        &self,
        target: &RunTarget,
        target_count: usize,
        generated: usize,
        failed: usize,
    ) -> (Option<String>, Option<String>) {
        let sheet = match self.state.load(&target.sheet_id) {
            Ok(sheet) => sheet,
            Err(e) => {
                error!(sheet_id = %target.sheet_id, error = %e, "Could not reload sheet for composite");
                return (None, Some(format!("could not reload sheet: {}", e)));
            }
        };
        if !SheetAggregator::should_composite(&sheet, target_count, generated, failed) {
            return (None, None);
        }

        info!(sheet_id = %target.sheet_id, run_id = %target.run_id, "Composite started");
        match self.composite.assemble(&sheet).await {
            Ok(url) => (Some(url), None),
            Err(e) => {
                error!(sheet_id = %target.sheet_id, error = %e, "Composite failed");
                (None, Some(e.to_string()))
            }
        }
    }
}

/// Frames a run should dispatch, in order.
///
/// Explicit ids are taken in the given order with duplicates dropped; otherwise every `pending`
/// or `error` frame in stored order.
pub fn select_targets(sheet: &SpriteSheet, requested: Option<&[FrameId]>) -> Vec<Frame> {
    match requested {
        Some(ids) => {
            let mut seen = HashSet::new();
            ids.iter()
                .filter(|id| seen.insert(id.as_str()))
                .filter_map(|id| sheet.frame(id).cloned())
                .collect()
        }
        None => sheet
            .frames
            .iter()
            .filter(|f| matches!(f.status, FrameStatus::Pending | FrameStatus::Error))
            .cloned()
            .collect(),
    }
}
