//! Integration tests for the batch scheduler
//!
//! Tests cover:
//! - Batch boundaries and ordering
//! - Concurrency bounded by batch size
//! - Pacing between batches
//! - Cancellation before dispatch and during pacing

use crate::integration::test_utils::{base_character, Harness, MockImageModel};
use sheetsmith::generation::{BatchScheduler, CancelFlag, RunTarget};
use sheetsmith::sheet::{Frame, FrameStatus};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn target(sheet_id: &str) -> RunTarget {
    RunTarget {
        sheet_id: sheet_id.to_string(),
        run_id: "run-test".to_string(),
        base_character: base_character(),
        world_style: None,
    }
}

fn frames_of(harness: &Harness, sheet_id: &str) -> Vec<Frame> {
    harness.load(sheet_id).frames
}

fn scheduler(harness: &Harness, pacing: Duration) -> BatchScheduler {
    BatchScheduler::new(
        Arc::clone(&harness.client),
        Arc::clone(&harness.state),
        pacing,
    )
}

#[tokio::test]
async fn test_each_batch_settles_before_the_next_starts() {
    let harness = Harness::new(MockImageModel::new());
    let id = harness.store_sheet("grid", 1, 7);
    harness.model.observe(Arc::clone(&harness.state), &id);

    let report = scheduler(&harness, Duration::ZERO)
        .run(&target(&id), frames_of(&harness, &id), 3, &CancelFlag::new())
        .await;

    assert_eq!(report.batch_sizes, vec![3, 3, 1]);
    assert_eq!(report.generated(), 7);
    assert_eq!(report.failed(), 0);
    assert!(!report.cancelled);
    // completed count seen by every call of a batch equals the frames of earlier batches
    assert_eq!(harness.model.completed_snapshots(), vec![0, 0, 0, 3, 3, 3, 6]);

    let batch_of: Vec<usize> = report.outcomes.iter().map(|o| o.batch_index).collect();
    assert!(batch_of.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_concurrency_never_exceeds_batch_size() {
    let harness = Harness::new(MockImageModel::new().with_delay(Duration::from_millis(40)));
    let id = harness.store_sheet("grid", 1, 5);

    let report = scheduler(&harness, Duration::ZERO)
        .run(&target(&id), frames_of(&harness, &id), 2, &CancelFlag::new())
        .await;

    assert_eq!(report.batch_sizes, vec![2, 2, 1]);
    assert_eq!(harness.model.max_in_flight(), 2);
}

#[tokio::test]
async fn test_batches_are_paced() {
    let harness = Harness::new(MockImageModel::new().with_delay(Duration::from_millis(1)));
    let id = harness.store_sheet("grid", 1, 3);

    let started = Instant::now();
    let report = scheduler(&harness, Duration::from_millis(100))
        .run(&target(&id), frames_of(&harness, &id), 1, &CancelFlag::new())
        .await;

    assert_eq!(report.batch_sizes, vec![1, 1, 1]);
    // two gaps between three batches, none after the last
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(started.elapsed() < Duration::from_millis(2000));
}

#[tokio::test]
async fn test_cancel_before_start_dispatches_nothing() {
    let harness = Harness::new(MockImageModel::new());
    let id = harness.store_sheet("grid", 2, 2);
    let cancel = CancelFlag::new();
    cancel.cancel();

    let report = scheduler(&harness, Duration::ZERO)
        .run(&target(&id), frames_of(&harness, &id), 2, &cancel)
        .await;

    assert!(report.cancelled);
    assert!(report.outcomes.is_empty());
    assert_eq!(report.skipped.len(), 4);
    assert_eq!(harness.model.call_count(), 0);
    let sheet = harness.load(&id);
    assert!(sheet.frames.iter().all(|f| f.status == FrameStatus::Pending));
}

#[tokio::test]
async fn test_cancel_during_pacing_skips_remaining_batches() {
    let harness = Harness::new(MockImageModel::new().with_delay(Duration::from_millis(5)));
    let id = harness.store_sheet("grid", 2, 2);
    let cancel = CancelFlag::new();
    let sched = scheduler(&harness, Duration::from_secs(30));
    let run_target = target(&id);

    let started = Instant::now();
    let (report, _) = tokio::join!(
        sched.run(&run_target, frames_of(&harness, &id), 2, &cancel),
        async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        }
    );

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(report.cancelled);
    assert_eq!(report.batch_sizes, vec![2]);
    assert_eq!(report.generated(), 2);
    assert_eq!(report.skipped, vec!["frame-1-0".to_string(), "frame-1-1".to_string()]);

    let sheet = harness.load(&id);
    assert_eq!(sheet.count_with_status(FrameStatus::Completed), 2);
    assert_eq!(sheet.count_with_status(FrameStatus::Pending), 2);
}
