//! Prompt construction for a single frame.
//!
//! Pure and deterministic: identical inputs always produce byte-identical prompts, and
//! near-identical frames produce near-identical prompts. Sections are emitted in a fixed
//! order and any absent or blank value is omitted entirely.

use crate::sheet::{BaseCharacter, FrameProperties, Position, WorldStyle};

const TECHNICAL_REQUIREMENTS: [&str; 5] = [
    "Transparent background (no scenery, no floor shadow)",
    "Game-ready sprite quality",
    "Character centered in the frame",
    "Crisp, clean edges without blur or artifacts",
    "Consistent character design, proportions and colors across all frames",
];

/// Build the generation prompt for one frame.
pub fn build_prompt(
    base: &BaseCharacter,
    frame: &FrameProperties,
    style: Option<&WorldStyle>,
    position: Option<Position>,
) -> String {
    let mut sections: Vec<String> = Vec::new();

    // 1. summary line
    let description = base.description.trim();
    sections.push(if description.is_empty() {
        format!(
            "Create a {} {} character sprite.",
            base.art_style.label(),
            base.character_type.label()
        )
    } else {
        format!(
            "Create a {} {} character sprite: {}",
            base.art_style.label(),
            base.character_type.label(),
            description
        )
    });

    // 2. base character properties
    let props = &base.base_properties;
    push_section(
        &mut sections,
        "Character details:",
        [
            bullet("Body type", props.body_type.as_deref()),
            bullet("Skin tone", props.skin_tone.as_deref()),
            bullet("Hair color", props.hair_color.as_deref()),
            bullet("Clothing style", props.clothing_style.as_deref()),
            bullet("Default expression", props.default_expression.as_deref()),
        ],
    );

    // 3. frame-specific properties
    push_section(
        &mut sections,
        "Frame details:",
        [
            bullet("Emotion", frame.emotion.as_deref()),
            bullet("Expression", frame.expression.as_deref()),
            bullet("Eyes", frame.eye_state.as_deref()),
            bullet("Mouth", frame.mouth_state.as_deref()),
            bullet("Clothing", frame.clothing.as_deref()),
            bullet("Outfit variant", frame.outfit_variant.as_deref()),
            bullet("Hairstyle", frame.hairstyle.as_deref()),
            bullet("Action", frame.action.as_deref()),
            bullet("Pose", frame.pose.as_deref()),
            bullet("Body pose", frame.body_pose.as_deref()),
            bullet("Hand position", frame.hand_position.as_deref()),
            bullet("Facing direction", frame.facing_direction.as_deref()),
            bullet("Leg position", frame.leg_position.as_deref()),
            bullet("Background", frame.background_type.as_deref()),
        ],
    );

    // 4. accessories and effects
    push_section(
        &mut sections,
        "Accessories and effects:",
        [
            list_bullet("Accessories", &frame.accessories),
            list_bullet("Special effects", &frame.special_effects),
        ],
    );

    // 5. color overrides
    let colors = &frame.color_variants;
    push_section(
        &mut sections,
        "Color overrides:",
        [
            bullet("Skin color", colors.skin_color.as_deref()),
            bullet("Hair color", colors.hair_color.as_deref()),
            bullet("Eye color", colors.eye_color.as_deref()),
            bullet("Accent color", colors.accent_color.as_deref()),
        ],
    );

    // 6. world style
    if let Some(style) = style {
        let params = &style.style_parameters;
        let palette = &style.extracted_palette;
        let name = style.name.trim();
        let title = if name.is_empty() {
            "World style:".to_string()
        } else {
            format!("World style ({name}):")
        };
        push_section(
            &mut sections,
            &title,
            [
                bullet("Description", style.description.as_deref()),
                bullet("Texture", params.texture_style.as_deref()),
                bullet("Line weight", params.line_weight.as_deref()),
                bullet("Perspective", params.perspective.as_deref()),
                bullet("Lighting", params.lighting.as_deref()),
                bullet("Detail level", params.detail_level.as_deref()),
                list_bullet("Primary palette", &palette.primary),
                list_bullet("Secondary palette", &palette.secondary),
                list_bullet("Accent palette", &palette.accent),
            ],
        );
    }

    // 7. fixed technical requirements
    let mut technical = String::from("Technical requirements:");
    for requirement in TECHNICAL_REQUIREMENTS {
        technical.push_str("\n- ");
        technical.push_str(requirement);
    }
    sections.push(technical);

    // 8. position / continuity
    if let Some(position) = position {
        sections.push(format!(
            "Sprite sheet position: row {}, column {}. Keep scale, baseline and framing \
             continuous with the neighboring frames of the sheet.",
            position.row, position.col
        ));
    }

    // 9. custom modifiers
    push_section(
        &mut sections,
        "Additional modifiers:",
        frame.custom_modifiers.iter().map(|m| bare_bullet(m)),
    );

    // 10. generation hints
    let hints = &frame.generation_hints;
    push_section(
        &mut sections,
        "Generation hints:",
        [
            bullet(
                "Consistency priority",
                hints.consistency_priority.map(|p| p.as_str()),
            ),
            bullet("Detail level", hints.detail_level.as_deref()),
            bullet("Style emphasis", hints.style_emphasis.as_deref()),
        ],
    );

    sections.join("\n\n")
}

fn push_section<I>(sections: &mut Vec<String>, title: &str, bullets: I)
where
    I: IntoIterator<Item = Option<String>>,
{
    let lines: Vec<String> = bullets.into_iter().flatten().collect();
    if lines.is_empty() {
        return;
    }
    let mut section = String::from(title);
    for line in lines {
        section.push('\n');
        section.push_str(&line);
    }
    sections.push(section);
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn bullet(label: &str, value: Option<&str>) -> Option<String> {
    non_blank(value).map(|v| format!("- {label}: {v}"))
}

fn bare_bullet(value: &str) -> Option<String> {
    non_blank(Some(value)).map(|v| format!("- {v}"))
}

fn list_bullet(label: &str, values: &[String]) -> Option<String> {
    let items: Vec<&str> = values.iter().filter_map(|v| non_blank(Some(v))).collect();
    if items.is_empty() {
        None
    } else {
        Some(format!("- {label}: {}", items.join(", ")))
    }
}
