//! Frame generation orchestration.
//!
//! A run flows through: target selection and validation ([`orchestrator`]), batched dispatch
//! ([`scheduler`]) of one model call per frame ([`client`]), status writes ([`state`]),
//! sheet-level aggregation ([`aggregator`]) and, on full success, composite assembly
//! ([`composite`]). [`jobs`] runs all of it in the background.

pub mod aggregator;
pub mod client;
pub mod composite;
pub mod jobs;
pub mod orchestrator;
pub mod request;
pub mod scheduler;
pub mod state;

pub use aggregator::SheetAggregator;
pub use client::FrameGenerationClient;
pub use composite::{CompositeAssembler, ImageCompositeAssembler};
pub use jobs::GenerationService;
pub use orchestrator::{select_targets, GenerationOrchestrator, PreparedRun};
pub use request::{
    FrameOutcome, GenerationAck, GenerationMetadata, GenerationRequest, GenerationResult,
    ImageRef, Priority, SheetRef, SheetStatusReport,
};
pub use scheduler::{BatchScheduler, CancelFlag, RunTarget, ScheduleReport};
pub use state::FrameStateStore;
