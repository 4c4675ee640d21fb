//! Persistence capabilities consumed by the orchestrator.
//!
//! - [`objects`]: binary object storage for frame images and composites
//! - [`records`]: metadata persistence for sprite sheet records

pub mod objects;
pub mod records;

pub use objects::{composite_object_key, frame_object_key, FilesystemObjectStore, ObjectStore};
pub use records::{SheetStore, SledSheetStore};
