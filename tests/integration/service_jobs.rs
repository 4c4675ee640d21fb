//! Integration tests for background generation jobs
//!
//! Tests cover:
//! - Immediate acknowledgement and status polling
//! - Refusing a second run on the same sheet
//! - Cancellation of a live job
//! - Recovery of sheets interrupted mid-run

use crate::integration::test_utils::{fast_settings, sheet_fixture, Harness, MockImageModel};
use sheetsmith::config::GenerationSettings;
use sheetsmith::error::ApiError;
use sheetsmith::generation::state::INTERRUPTED_MESSAGE;
use sheetsmith::generation::{GenerationRequest, Priority};
use sheetsmith::sheet::{FrameStatus, FrameUpdate, SheetStatus};
use std::time::Duration;

#[tokio::test]
async fn test_start_acknowledges_then_status_tracks_the_run() {
    let harness = Harness::new(MockImageModel::new().with_delay(Duration::from_millis(200)));
    let id = harness.store_sheet("hero", 2, 2);

    let ack = harness
        .service
        .start_generation(GenerationRequest::for_sheet(id.clone()))
        .unwrap();
    assert_eq!(ack.sheet_id, id);
    assert_eq!(ack.frames_queued, 4);
    // two quality batches at 20s each, no pacing
    assert_eq!(ack.estimated_seconds, 40);
    assert!(ack.run_id.starts_with("run-"));

    let running = harness.service.query_status(&id).unwrap();
    assert_eq!(running.status, SheetStatus::Generating);
    assert_eq!(running.active_run_id.as_deref(), Some(ack.run_id.as_str()));
    assert!(harness.service.is_running(&id));

    let result = harness.service.wait(&id).await.unwrap();
    assert_eq!(result.run_id, ack.run_id);
    assert_eq!(result.generated_frames, 4);

    let done = harness.service.query_status(&id).unwrap();
    assert_eq!(done.status, SheetStatus::Completed);
    assert_eq!(done.generation_progress.completed_frames, 4);
    assert_eq!(done.generation_progress.total_frames, 4);
    assert!(done.active_run_id.is_none());
    assert!(done.final_image_url.is_some());
}

#[tokio::test]
async fn test_second_start_on_same_sheet_is_refused() {
    let harness = Harness::new(MockImageModel::new().with_delay(Duration::from_millis(200)));
    let id = harness.store_sheet("hero", 1, 2);

    harness
        .service
        .start_generation(GenerationRequest::for_sheet(id.clone()))
        .unwrap();
    let err = harness
        .service
        .start_generation(GenerationRequest::for_sheet(id.clone()).with_priority(Priority::Speed))
        .unwrap_err();
    assert!(matches!(err, ApiError::GenerationInProgress(ref s) if s == &id));

    // another sheet is independent
    let other = harness.store_sheet("villain", 1, 1);
    harness
        .service
        .start_generation(GenerationRequest::for_sheet(other.clone()))
        .unwrap();

    harness.service.wait(&id).await.unwrap();
    harness.service.wait(&other).await.unwrap();
    assert_eq!(harness.model.call_count(), 3);
}

#[tokio::test]
async fn test_stale_active_run_marker_blocks_a_new_run() {
    let harness = Harness::new(MockImageModel::new());
    let id = harness.store_sheet("hero", 1, 1);
    harness
        .state
        .begin_run(&id, &"run-elsewhere".to_string(), vec!["frame-0-0".into()], 0)
        .unwrap();

    let err = harness
        .service
        .start_generation(GenerationRequest::for_sheet(id.clone()))
        .unwrap_err();
    assert!(matches!(err, ApiError::GenerationInProgress(_)));
    assert_eq!(harness.model.call_count(), 0);
}

#[tokio::test]
async fn test_cancel_leaves_undispatched_frames_pending() {
    let settings = GenerationSettings {
        pacing_ms: 30_000,
        ..fast_settings()
    };
    let harness = Harness::with_settings(
        MockImageModel::new().with_delay(Duration::from_millis(50)),
        settings,
    );
    let id = harness.store_sheet("hero", 1, 3);

    harness
        .service
        .start_generation(GenerationRequest::for_sheet(id.clone()).with_batch_size(1))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    let run_id = harness.service.cancel(&id).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), harness.service.wait(&id))
        .await
        .expect("cancelled run should finish promptly")
        .unwrap();

    assert_eq!(result.run_id, run_id);
    assert!(result.cancelled);
    assert!(result.final_sprite_sheet_url.is_none());
    assert!(result.skipped_frames.len() >= 2);
    assert_eq!(
        result.generated_frames + result.failed_frames + result.skipped_frames.len(),
        3
    );

    let sheet = harness.load(&id);
    assert!(sheet.active_run.is_none());
    assert_eq!(sheet.count_with_status(FrameStatus::Generating), 0);
    assert!(sheet.count_with_status(FrameStatus::Pending) >= 2);
    assert_ne!(sheet.status, SheetStatus::Generating);
}

#[tokio::test]
async fn test_cancel_without_job_is_not_found() {
    let harness = Harness::new(MockImageModel::new());
    let id = harness.store_sheet("hero", 1, 1);
    assert!(matches!(
        harness.service.cancel(&id),
        Err(ApiError::JobNotFound(_))
    ));
    assert!(matches!(
        harness.service.wait(&id).await,
        Err(ApiError::JobNotFound(_))
    ));
}

#[test]
fn test_start_outside_runtime_fails_cleanly() {
    let harness = Harness::new(MockImageModel::new());
    let id = harness.store_sheet("hero", 1, 1);
    let err = harness
        .service
        .start_generation(GenerationRequest::for_sheet(id.clone()))
        .unwrap_err();
    assert!(matches!(err, ApiError::JobFailed(_)));
    assert!(harness.load(&id).active_run.is_none());
}

#[tokio::test]
async fn test_recovery_fails_interrupted_frames_and_allows_retry() {
    let harness = Harness::new(MockImageModel::new());
    let id = harness.store_sheet("hero", 1, 2);

    // a process died after dispatching frame-0-0
    harness
        .state
        .begin_run(
            &id,
            &"run-crashed".to_string(),
            vec!["frame-0-0".into(), "frame-0-1".into()],
            0,
        )
        .unwrap();
    harness
        .state
        .set_status(&id, "frame-0-0", FrameStatus::Generating, FrameUpdate::default())
        .unwrap();
    assert_eq!(harness.load(&id).status, SheetStatus::Generating);

    assert_eq!(harness.service.recover_interrupted().unwrap(), 1);

    let sheet = harness.load(&id);
    assert!(sheet.active_run.is_none());
    let frame = sheet.frame("frame-0-0").unwrap();
    assert_eq!(frame.status, FrameStatus::Error);
    assert_eq!(frame.error_message.as_deref(), Some(INTERRUPTED_MESSAGE));
    assert_eq!(sheet.status, SheetStatus::Error);

    // nothing left to recover
    assert_eq!(harness.service.recover_interrupted().unwrap(), 0);

    let result = harness
        .orchestrator
        .generate(GenerationRequest::for_sheet(id.clone()))
        .await
        .unwrap();
    assert_eq!(result.generated_frames, 2);
    assert_eq!(result.status, SheetStatus::Completed);
}

#[tokio::test]
async fn test_validate_configuration_reports_every_problem() {
    let harness = Harness::new(MockImageModel::new());
    let mut sheet = sheet_fixture("bad", 2, 2);
    sheet.base_character.description = "  ".to_string();
    sheet.frames.pop();

    let report = harness.service.validate_configuration(&sheet);
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors.iter().any(|e| e.contains("description")));
    assert!(report.errors.iter().any(|e| e.contains("frame count mismatch")));
}
