//! Sheet domain: base character, world style, frames and the sprite sheet record.

pub mod character;
pub mod frame;
pub mod sprite_sheet;
pub mod style;

pub use character::{ArtStyle, BaseCharacter, BaseProperties, CharacterType};
pub use frame::{
    ColorVariants, ConsistencyPriority, Frame, FrameGenerationMetadata, FrameProperties,
    FrameStatus, FrameUpdate, GenerationHints, Position,
};
pub use sprite_sheet::{
    ActiveRun, Dimensions, FrameDefinition, FrameSize, GenerationProgress, OutputSettings,
    SheetDefinition, SheetStatus, SpriteSheet, MAX_GRID, MIN_GRID,
};
pub use style::{Palette, StyleParameters, WorldStyle};
