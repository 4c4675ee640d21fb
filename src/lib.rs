//! Sheetsmith: sprite sheet frame generation
//!
//! Takes a sprite sheet definition (a grid of frames sharing one base character), generates
//! each frame image through an external image model in paced batches, tracks per-frame status
//! in a persistent store and assembles the final sheet image once every frame has completed.

pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod prompt;
pub mod provider;
pub mod sheet;
pub mod storage;
pub mod types;
pub mod validation;
