//! Base character shared by every frame of a sheet.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtStyle {
    Pixel,
    Cartoon,
    Realistic,
    Anime,
    Chibi,
    LowPoly,
    HandDrawn,
    Vector,
}

impl ArtStyle {
    /// Wording used inside generation prompts.
    pub fn label(self) -> &'static str {
        match self {
            ArtStyle::Pixel => "pixel art",
            ArtStyle::Cartoon => "cartoon",
            ArtStyle::Realistic => "realistic",
            ArtStyle::Anime => "anime",
            ArtStyle::Chibi => "chibi",
            ArtStyle::LowPoly => "low poly",
            ArtStyle::HandDrawn => "hand-drawn",
            ArtStyle::Vector => "vector",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterType {
    Humanoid,
    Creature,
    Robot,
    Animal,
    FantasyBeing,
    Monster,
}

impl CharacterType {
    pub fn label(self) -> &'static str {
        match self {
            CharacterType::Humanoid => "humanoid",
            CharacterType::Creature => "creature",
            CharacterType::Robot => "robot",
            CharacterType::Animal => "animal",
            CharacterType::FantasyBeing => "fantasy being",
            CharacterType::Monster => "monster",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin_tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hair_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clothing_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_expression: Option<String>,
}

/// Immutable for the lifetime of a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseCharacter {
    pub description: String,
    pub art_style: ArtStyle,
    pub character_type: CharacterType,
    #[serde(default)]
    pub base_properties: BaseProperties,
}
