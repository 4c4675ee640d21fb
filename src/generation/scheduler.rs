//! Batched concurrent dispatch of frame generations.
//!
//! Targets are split into consecutive batches. All frames of a batch run concurrently and the
//! whole batch settles before the next one starts; a fixed pacing delay separates batches.

use crate::error::GenerationError;
use crate::generation::client::FrameGenerationClient;
use crate::generation::request::FrameOutcome;
use crate::generation::state::FrameStateStore;
use crate::prompt::build_prompt;
use crate::sheet::{BaseCharacter, Frame, FrameGenerationMetadata, FrameStatus, FrameUpdate, WorldStyle};
use crate::types::{now_millis, short_digest, FrameId, RunId, SheetId};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Shared cancellation signal for one run. Checked before every batch and during pacing;
/// frames already dispatched run to completion or timeout.
#[derive(Clone)]
pub struct CancelFlag {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelFlag {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`CancelFlag::cancel`] has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Inputs shared by every frame of a run.
#[derive(Debug, Clone)]
pub struct RunTarget {
    pub sheet_id: SheetId,
    pub run_id: RunId,
    pub base_character: BaseCharacter,
    pub world_style: Option<WorldStyle>,
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleReport {
    /// Outcomes in completion order.
    pub outcomes: Vec<FrameOutcome>,
    /// Size of every dispatched batch, in dispatch order.
    pub batch_sizes: Vec<usize>,
    /// Targets never dispatched because the run was cancelled.
    pub skipped: Vec<FrameId>,
    pub cancelled: bool,
}

impl ScheduleReport {
    pub fn generated(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.generated()
    }
}

pub struct BatchScheduler {
    client: Arc<FrameGenerationClient>,
    state: Arc<FrameStateStore>,
    pacing: Duration,
}

impl BatchScheduler {
    pub fn new(client: Arc<FrameGenerationClient>, state: Arc<FrameStateStore>, pacing: Duration) -> Self {
        Self {
            client,
            state,
            pacing,
        }
    }

    /// Run every frame in `frames` (order preserved) in batches of `batch_size`.
    ///
    /// Every dispatched frame ends `completed` or `error`; individual failures never stop
    /// sibling frames or later batches.
    pub async fn run(
        &self,
        target: &RunTarget,
        frames: Vec<Frame>,
        batch_size: usize,
        cancel: &CancelFlag,
    ) -> ScheduleReport {
        let batch_size = batch_size.max(1);
        let batches: Vec<&[Frame]> = frames.chunks(batch_size).collect();
        let total_batches = batches.len();
        let mut report = ScheduleReport::default();

        for (batch_index, batch) in batches.iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                report.skipped = frames[batch_index * batch_size..]
                    .iter()
                    .map(|f| f.id.clone())
                    .collect();
                info!(
                    sheet_id = %target.sheet_id,
                    run_id = %target.run_id,
                    skipped = report.skipped.len(),
                    "Run cancelled before batch {}",
                    batch_index
                );
                break;
            }

            info!(
                sheet_id = %target.sheet_id,
                run_id = %target.run_id,
                batch_index,
                total_batches,
                frames = batch.len(),
                "Batch started"
            );
            report.batch_sizes.push(batch.len());

            let mut futures = FuturesUnordered::new();
            for frame in batch.iter() {
                match self.mark_generating(target, frame) {
                    Ok(()) => futures.push(self.process_frame(target, frame, batch_index)),
                    Err(err) => {
                        warn!(
                            sheet_id = %target.sheet_id,
                            frame_id = %frame.id,
                            error = %err,
                            "Frame not dispatched"
                        );
                        let metadata = FrameGenerationMetadata {
                            run_id: Some(target.run_id.clone()),
                            ..Default::default()
                        };
                        self.record_failure(target, frame, &err, metadata);
                        report.outcomes.push(FrameOutcome {
                            frame_id: frame.id.clone(),
                            position: frame.position,
                            batch_index,
                            result: Err(err),
                        });
                    }
                }
            }

            let mut generated = 0usize;
            let mut failed = 0usize;
            while let Some(outcome) = futures.next().await {
                match &outcome.result {
                    Ok(image_ref) => {
                        generated += 1;
                        info!(
                            sheet_id = %target.sheet_id,
                            frame_id = %outcome.frame_id,
                            batch_index,
                            duration_ms = image_ref.duration_ms,
                            "Frame completed"
                        );
                    }
                    Err(err) => {
                        failed += 1;
                        warn!(
                            sheet_id = %target.sheet_id,
                            frame_id = %outcome.frame_id,
                            batch_index,
                            error = %err,
                            "Frame failed"
                        );
                    }
                }
                report.outcomes.push(outcome);
            }

            info!(
                sheet_id = %target.sheet_id,
                run_id = %target.run_id,
                batch_index,
                generated,
                failed,
                "Batch completed"
            );

            let is_last = batch_index + 1 == total_batches;
            if !is_last && !self.pacing.is_zero() {
                debug!(pacing_ms = self.pacing.as_millis() as u64, "Pacing before next batch");
                tokio::select! {
                    _ = tokio::time::sleep(self.pacing) => {}
                    _ = cancel.cancelled() => {}
                }
            }
        }

        report
    }

    fn mark_generating(&self, target: &RunTarget, frame: &Frame) -> Result<(), GenerationError> {
        let metadata = FrameGenerationMetadata {
            run_id: Some(target.run_id.clone()),
            started_at_ms: Some(now_millis()),
            ..Default::default()
        };
        self.state
            .set_status(
                &target.sheet_id,
                &frame.id,
                FrameStatus::Generating,
                FrameUpdate {
                    metadata: Some(metadata),
                    ..Default::default()
                },
            )
            .map(|_| ())
            .map_err(|e| GenerationError::StatusWrite(e.to_string()))
    }

    async fn process_frame(&self, target: &RunTarget, frame: &Frame, batch_index: usize) -> FrameOutcome {
        let prompt = build_prompt(
            &target.base_character,
            &frame.properties,
            target.world_style.as_ref(),
            Some(frame.position),
        );
        let started_at_ms = now_millis();
        debug!(sheet_id = %target.sheet_id, frame_id = %frame.id, "Frame started");

        let generated = self
            .client
            .generate(&target.sheet_id, frame.position, &prompt)
            .await;

        let finished_at_ms = now_millis();
        let mut metadata = FrameGenerationMetadata {
            run_id: Some(target.run_id.clone()),
            started_at_ms: Some(started_at_ms),
            finished_at_ms: Some(finished_at_ms),
            duration_ms: Some(finished_at_ms.saturating_sub(started_at_ms)),
            mime_type: None,
            prompt_digest: Some(short_digest(prompt.as_bytes())),
        };

        let result = match generated {
            Ok(image_ref) => {
                metadata.mime_type = Some(image_ref.mime_type.clone());
                match self.state.set_status(
                    &target.sheet_id,
                    &frame.id,
                    FrameStatus::Completed,
                    FrameUpdate::completed(image_ref.url.clone(), metadata.clone()),
                ) {
                    Ok(_) => Ok(image_ref),
                    Err(e) => {
                        let err = GenerationError::StatusWrite(e.to_string());
                        self.record_failure(target, frame, &err, metadata);
                        Err(err)
                    }
                }
            }
            Err(err) => {
                self.record_failure(target, frame, &err, metadata);
                Err(err)
            }
        };

        FrameOutcome {
            frame_id: frame.id.clone(),
            position: frame.position,
            batch_index,
            result,
        }
    }

    fn record_failure(
        &self,
        target: &RunTarget,
        frame: &Frame,
        err: &GenerationError,
        metadata: FrameGenerationMetadata,
    ) {
        if let Err(write_err) = self.state.set_status(
            &target.sheet_id,
            &frame.id,
            FrameStatus::Error,
            FrameUpdate::failed(err.to_string(), Some(metadata)),
        ) {
            warn!(
                sheet_id = %target.sheet_id,
                frame_id = %frame.id,
                error = %write_err,
                "Failed to record frame failure"
            );
        }
    }
}
