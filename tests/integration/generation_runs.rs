//! Integration tests for complete generation runs
//!
//! Tests cover:
//! - Full success with composite assembly
//! - Partial failure isolation
//! - Retrying failed frames
//! - Composite-only reruns
//! - Request validation before any model call
//! - Composite and status-write failures

use crate::integration::test_utils::{
    fast_settings, sheet_fixture, FailingComposite, FlakyStore, Harness, MockImageModel,
};
use sheetsmith::error::ApiError;
use sheetsmith::generation::{CompositeAssembler, GenerationRequest, ImageCompositeAssembler};
use sheetsmith::sheet::{FrameStatus, SheetStatus, WorldStyle};
use sheetsmith::storage::{ObjectStore, SheetStore};
use std::sync::Arc;

#[tokio::test]
async fn test_all_frames_succeed_and_composite_is_stored() {
    let harness = Harness::new(MockImageModel::new());
    let id = harness.store_sheet("hero", 2, 2);

    let result = harness
        .orchestrator
        .generate(GenerationRequest::for_sheet(id.clone()).with_batch_size(2))
        .await
        .unwrap();

    assert_eq!(result.generated_frames, 4);
    assert_eq!(result.failed_frames, 0);
    assert!(result.errors.is_empty());
    assert_eq!(result.status, SheetStatus::Completed);
    let url = result.final_sprite_sheet_url.clone().expect("composite url");

    let sheet = harness.load(&id);
    assert_eq!(sheet.status, SheetStatus::Completed);
    assert_eq!(sheet.final_image_url.as_deref(), Some(url.as_str()));
    assert_eq!(sheet.generation_progress.completed_frames, 4);
    assert!(sheet.active_run.is_none());
    for frame in &sheet.frames {
        assert_eq!(frame.status, FrameStatus::Completed);
        assert!(frame.image_ref.is_some());
        assert!(frame.error_message.is_none());
        let meta = frame.generation_metadata.as_ref().unwrap();
        assert_eq!(meta.run_id.as_deref(), Some(result.run_id.as_str()));
        assert_eq!(meta.mime_type.as_deref(), Some("image/png"));
    }

    let bytes = harness.objects.fetch(&url).await.unwrap();
    let composite = image::load_from_memory(&bytes).unwrap();
    assert_eq!((composite.width(), composite.height()), (32, 32));
}

#[tokio::test]
async fn test_one_failure_does_not_stop_siblings() {
    let model = MockImageModel::new();
    model.fail_at(0, 1);
    let harness = Harness::new(model);
    let id = harness.store_sheet("hero", 2, 2);

    let result = harness
        .orchestrator
        .generate(GenerationRequest::for_sheet(id.clone()).with_batch_size(2))
        .await
        .unwrap();

    assert_eq!(result.generated_frames, 3);
    assert_eq!(result.failed_frames, 1);
    assert_eq!(result.status, SheetStatus::Error);
    assert!(result.final_sprite_sheet_url.is_none());
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("frame-0-1"));
    assert_eq!(harness.model.call_count(), 4);

    let sheet = harness.load(&id);
    assert_eq!(sheet.status, SheetStatus::Error);
    assert!(sheet.final_image_url.is_none());
    assert_eq!(sheet.generation_progress.completed_frames, 3);
    assert_eq!(sheet.generation_progress.errors.len(), 1);

    let failed = sheet.frame("frame-0-1").unwrap();
    assert_eq!(failed.status, FrameStatus::Error);
    assert!(failed.image_ref.is_none());
    assert!(failed
        .error_message
        .as_deref()
        .unwrap()
        .contains("mock provider refused"));
    for id in ["frame-0-0", "frame-1-0", "frame-1-1"] {
        assert_eq!(sheet.frame(id).unwrap().status, FrameStatus::Completed);
    }
}

#[tokio::test]
async fn test_empty_image_is_a_frame_failure() {
    let model = MockImageModel::new();
    model.empty_at(0, 0);
    let harness = Harness::new(model);
    let id = harness.store_sheet("hero", 1, 2);

    let result = harness
        .orchestrator
        .generate(GenerationRequest::for_sheet(id.clone()))
        .await
        .unwrap();

    assert_eq!(result.failed_frames, 1);
    let frame = harness.load(&id).frame("frame-0-0").cloned().unwrap();
    assert_eq!(frame.error_message.as_deref(), Some("model returned no image"));
}

#[tokio::test]
async fn test_rerun_targets_only_failed_frames() {
    let model = MockImageModel::new();
    model.fail_at(1, 0);
    let harness = Harness::new(model);
    let id = harness.store_sheet("hero", 2, 2);

    let first = harness
        .orchestrator
        .generate(GenerationRequest::for_sheet(id.clone()))
        .await
        .unwrap();
    assert_eq!(first.failed_frames, 1);
    let completed_before: Vec<Option<String>> = harness
        .load(&id)
        .frames
        .iter()
        .map(|f| f.image_ref.clone())
        .collect();

    harness.model.clear_failures();
    let second = harness
        .orchestrator
        .generate(GenerationRequest::for_sheet(id.clone()))
        .await
        .unwrap();

    assert_eq!(second.generated_frames, 1);
    assert_eq!(second.failed_frames, 0);
    assert_eq!(harness.model.call_count(), 5);
    assert_eq!(second.status, SheetStatus::Completed);
    assert!(second.final_sprite_sheet_url.is_some());

    let sheet = harness.load(&id);
    // frames completed in the first run are untouched
    for (frame, before) in sheet.frames.iter().zip(completed_before) {
        if frame.id != "frame-1-0" {
            assert_eq!(frame.image_ref, before);
        }
    }
    assert!(sheet.generation_progress.errors.is_empty());
}

#[tokio::test]
async fn test_completed_sheet_without_composite_reassembles_only() {
    let harness = Harness::new(MockImageModel::new());
    let id = harness.store_sheet("hero", 1, 3);
    let first = harness
        .orchestrator
        .generate(GenerationRequest::for_sheet(id.clone()))
        .await
        .unwrap();
    let first_url = first.final_sprite_sheet_url.unwrap();

    let mut sheet = harness.load(&id);
    sheet.final_image_url = None;
    harness.state.save(&mut sheet).unwrap();
    assert_eq!(harness.load(&id).status, SheetStatus::Draft);

    let second = harness
        .orchestrator
        .generate(GenerationRequest::for_sheet(id.clone()))
        .await
        .unwrap();

    assert_eq!(second.generated_frames, 0);
    assert_eq!(harness.model.call_count(), 3);
    // identical frames produce the same content-addressed composite
    assert_eq!(second.final_sprite_sheet_url.as_deref(), Some(first_url.as_str()));
    assert_eq!(harness.load(&id).status, SheetStatus::Completed);
}

#[tokio::test]
async fn test_explicit_frames_regenerate_completed_frames() {
    let harness = Harness::new(MockImageModel::new());
    let id = harness.store_sheet("hero", 1, 2);
    harness
        .orchestrator
        .generate(GenerationRequest::for_sheet(id.clone()))
        .await
        .unwrap();

    let result = harness
        .orchestrator
        .generate(GenerationRequest::for_sheet(id.clone()).with_frames(vec!["frame-0-1".into()]))
        .await
        .unwrap();

    assert_eq!(result.generated_frames, 1);
    assert_eq!(harness.model.call_count(), 3);
    assert!(harness.model.prompts()[2].contains("row 0, column 1."));
    assert_eq!(harness.load(&id).status, SheetStatus::Completed);
}

#[tokio::test]
async fn test_world_style_reaches_every_prompt() {
    let harness = Harness::new(MockImageModel::new());
    let id = harness.store_sheet("hero", 1, 2);
    let style = WorldStyle {
        name: "Moonlit Marsh".to_string(),
        description: None,
        style_parameters: Default::default(),
        extracted_palette: Default::default(),
    };

    harness
        .orchestrator
        .generate(GenerationRequest::for_sheet(id).with_world_style(style))
        .await
        .unwrap();

    let prompts = harness.model.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts.iter().all(|p| p.contains("Moonlit Marsh")));
    assert!(prompts.iter().all(|p| p.contains("goblin tinkerer")));
}

#[tokio::test]
async fn test_invalid_request_makes_no_model_call() {
    let harness = Harness::new(MockImageModel::new());
    let id = harness.store_sheet("hero", 2, 2);

    let err = harness
        .orchestrator
        .generate(
            GenerationRequest::for_sheet(id.clone())
                .with_frames(vec!["frame-9-9".into()])
                .with_batch_size(0),
        )
        .await
        .unwrap_err();

    match err {
        ApiError::Validation(errors) => {
            assert_eq!(errors.len(), 2);
            assert!(errors.iter().any(|e| e.contains("frame-9-9")));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(harness.model.call_count(), 0);
    let sheet = harness.load(&id);
    assert!(sheet.active_run.is_none());
    assert_eq!(sheet.status, SheetStatus::Draft);
}

#[tokio::test]
async fn test_unknown_sheet_is_rejected() {
    let harness = Harness::new(MockImageModel::new());
    let err = harness
        .orchestrator
        .generate(GenerationRequest::for_sheet("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::SheetNotFound(id) if id == "missing"));
}

#[tokio::test]
async fn test_inline_sheet_is_persisted_and_generated() {
    let harness = Harness::new(MockImageModel::new());
    let sheet = sheet_fixture("inline-sheet", 1, 1);

    let result = harness
        .orchestrator
        .generate(GenerationRequest::inline(sheet))
        .await
        .unwrap();

    assert_eq!(result.sheet_id, "inline-sheet");
    assert_eq!(result.generated_frames, 1);
    assert_eq!(harness.load("inline-sheet").status, SheetStatus::Completed);
}

#[tokio::test]
async fn test_composite_failure_marks_sheet_error_and_composite_only_rerun_recovers() {
    let harness = Harness::build(
        MockImageModel::new(),
        fast_settings(),
        |records| records,
        |objects| -> Arc<dyn CompositeAssembler> { Arc::new(FailingComposite::new(objects, 1)) },
    );
    let id = harness.store_sheet("brittle", 2, 2);

    let result = harness
        .orchestrator
        .generate(GenerationRequest::for_sheet(id.clone()))
        .await
        .unwrap();
    assert_eq!(result.generated_frames, 4);
    assert_eq!(result.failed_frames, 0);
    assert_eq!(result.status, SheetStatus::Error);
    assert!(result.final_sprite_sheet_url.is_none());
    assert!(result.errors.iter().any(|e| e.starts_with("composite:")));

    let sheet = harness.load(&id);
    assert_eq!(sheet.status, SheetStatus::Error);
    assert!(sheet.composite_error.is_some());
    assert!(sheet.frames.iter().all(|f| f.status == FrameStatus::Completed));

    let rerun = harness
        .orchestrator
        .generate(GenerationRequest::for_sheet(id.clone()))
        .await
        .unwrap();
    assert_eq!(rerun.generated_frames, 0);
    assert_eq!(rerun.status, SheetStatus::Completed);
    assert!(rerun.final_sprite_sheet_url.is_some());
    assert_eq!(harness.model.call_count(), 4);

    let sheet = harness.load(&id);
    assert!(sheet.composite_error.is_none());
    assert!(sheet.final_image_url.is_some());
}

#[tokio::test]
async fn test_lost_generating_write_ends_frame_in_error() {
    let harness = Harness::build(
        MockImageModel::new(),
        fast_settings(),
        |records| -> Arc<dyn SheetStore> {
            Arc::new(FlakyStore::new(records).fail_next_put_when(|sheet| {
                sheet
                    .frame("frame-0-0")
                    .is_some_and(|f| f.status == FrameStatus::Generating)
            }))
        },
        |objects| -> Arc<dyn CompositeAssembler> {
            Arc::new(ImageCompositeAssembler::new(objects))
        },
    );
    let id = harness.store_sheet("flaky", 1, 2);

    let result = harness
        .orchestrator
        .generate(GenerationRequest::for_sheet(id.clone()).with_batch_size(2))
        .await
        .unwrap();
    assert_eq!(result.generated_frames, 1);
    assert_eq!(result.failed_frames, 1);
    assert_eq!(result.status, SheetStatus::Error);
    assert_eq!(harness.model.call_count(), 1);

    let sheet = harness.load(&id);
    let frame = sheet.frame("frame-0-0").unwrap();
    assert_eq!(frame.status, FrameStatus::Error);
    assert!(frame.error_message.is_some());
    assert_eq!(sheet.frame("frame-0-1").unwrap().status, FrameStatus::Completed);
    assert_eq!(sheet.generation_progress.errors.len(), 1);
    assert!(sheet.generation_progress.errors[0].contains("frame-0-0"));
}

#[tokio::test]
async fn test_failed_reload_before_composite_is_recorded() {
    let harness = Harness::build(
        MockImageModel::new(),
        fast_settings(),
        |records| -> Arc<dyn SheetStore> {
            Arc::new(FlakyStore::new(records).fail_next_get_when(|sheet| {
                sheet.active_run.is_some() && sheet.all_frames_completed()
            }))
        },
        |objects| -> Arc<dyn CompositeAssembler> {
            Arc::new(ImageCompositeAssembler::new(objects))
        },
    );
    let id = harness.store_sheet("reload", 1, 2);

    let result = harness
        .orchestrator
        .generate(GenerationRequest::for_sheet(id.clone()).with_batch_size(1))
        .await
        .unwrap();
    assert_eq!(result.generated_frames, 2);
    assert_eq!(result.status, SheetStatus::Error);

    let sheet = harness.load(&id);
    assert!(sheet.frames.iter().all(|f| f.status == FrameStatus::Completed));
    assert!(sheet
        .composite_error
        .as_deref()
        .is_some_and(|e| e.contains("could not reload sheet")));
}
