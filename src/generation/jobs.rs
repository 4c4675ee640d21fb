//! Background generation jobs and the caller-facing surface.
//!
//! A started run is spawned onto the tokio runtime and returns immediately with an
//! acknowledgement. Outcomes surface through [`GenerationService::query_status`]; callers that
//! want the final [`GenerationResult`] can [`GenerationService::wait`] for it.

use crate::error::ApiError;
use crate::generation::orchestrator::GenerationOrchestrator;
use crate::generation::request::{GenerationAck, GenerationRequest, GenerationResult, SheetStatusReport};
use crate::generation::scheduler::CancelFlag;
use crate::generation::state::needs_recovery;
use crate::sheet::SpriteSheet;
use crate::types::{RunId, SheetId};
use crate::validation::{validate_sheet, ValidationReport};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

struct GenerationJob {
    run_id: RunId,
    cancel: CancelFlag,
    handle: JoinHandle<Result<GenerationResult, ApiError>>,
}

impl GenerationJob {
    fn is_live(&self) -> bool {
        !self.handle.is_finished()
    }
}

pub struct GenerationService {
    orchestrator: Arc<GenerationOrchestrator>,
    jobs: Mutex<HashMap<SheetId, GenerationJob>>,
}

impl GenerationService {
    pub fn new(orchestrator: Arc<GenerationOrchestrator>) -> Self {
        Self {
            orchestrator,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    pub fn orchestrator(&self) -> &Arc<GenerationOrchestrator> {
        &self.orchestrator
    }

    /// Validate, claim the sheet and spawn the run. Must be called from within a tokio runtime.
    pub fn start_generation(&self, request: GenerationRequest) -> Result<GenerationAck, ApiError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ApiError::JobFailed(format!("no async runtime: {}", e)))?;

        let mut jobs = self.jobs.lock();
        let sheet_id = request.sheet_id().to_string();
        if jobs.get(&sheet_id).is_some_and(GenerationJob::is_live) {
            return Err(ApiError::GenerationInProgress(sheet_id));
        }

        let prepared = self.orchestrator.prepare(request)?;
        let ack = prepared.ack.clone();
        let cancel = CancelFlag::new();

        let orchestrator = Arc::clone(&self.orchestrator);
        let job_cancel = cancel.clone();
        let handle = runtime.spawn(async move { orchestrator.execute(prepared, &job_cancel).await });

        info!(
            sheet_id = %ack.sheet_id,
            run_id = %ack.run_id,
            frames_queued = ack.frames_queued,
            estimated_seconds = ack.estimated_seconds,
            "Generation job started"
        );
        jobs.insert(
            ack.sheet_id.clone(),
            GenerationJob {
                run_id: ack.run_id.clone(),
                cancel,
                handle,
            },
        );
        Ok(ack)
    }

    /// Current status and progress of a stored sheet. Safe to poll at any time.
    pub fn query_status(&self, sheet_id: &str) -> Result<SheetStatusReport, ApiError> {
        let sheet = self
            .orchestrator
            .state()
            .store()
            .get_sheet(sheet_id)?
            .ok_or_else(|| ApiError::SheetNotFound(sheet_id.to_string()))?;
        Ok(SheetStatusReport::from(&sheet))
    }

    pub fn validate_configuration(&self, sheet: &SpriteSheet) -> ValidationReport {
        validate_sheet(sheet)
    }

    pub fn is_running(&self, sheet_id: &str) -> bool {
        self.jobs
            .lock()
            .get(sheet_id)
            .is_some_and(GenerationJob::is_live)
    }

    /// Request cancellation of a live job. Undispatched frames keep their status.
    pub fn cancel(&self, sheet_id: &str) -> Result<RunId, ApiError> {
        let jobs = self.jobs.lock();
        match jobs.get(sheet_id) {
            Some(job) if job.is_live() => {
                job.cancel.cancel();
                info!(sheet_id, run_id = %job.run_id, "Generation job cancelled");
                Ok(job.run_id.clone())
            }
            _ => Err(ApiError::JobNotFound(sheet_id.to_string())),
        }
    }

    /// Await the result of the most recent job for a sheet.
    pub async fn wait(&self, sheet_id: &str) -> Result<GenerationResult, ApiError> {
        let job = self
            .jobs
            .lock()
            .remove(sheet_id)
            .ok_or_else(|| ApiError::JobNotFound(sheet_id.to_string()))?;
        match job.handle.await {
            Ok(result) => result,
            Err(e) => {
                warn!(sheet_id, run_id = %job.run_id, error = %e, "Generation job aborted");
                Err(ApiError::JobFailed(e.to_string()))
            }
        }
    }

    /// Recover sheets left mid-run by an earlier process, skipping sheets this service is
    /// currently generating. Returns the number of frames changed.
    pub fn recover_interrupted(&self) -> Result<usize, ApiError> {
        let state = self.orchestrator.state();
        let mut changed = 0usize;
        for sheet in state.store().list_sheets()? {
            if needs_recovery(&sheet) && !self.is_running(&sheet.id) {
                changed += state.recover_sheet(&sheet.id)?;
            }
        }
        Ok(changed)
    }
}
