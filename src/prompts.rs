// src/prompts.rs
//! Instruction text sent to the language model and the image generator.

use std::path::Path;

use crate::models::{DesignPreferences, DesignRecommendation, RoomAnalysis};

const NOT_SPECIFIED: &str = "not specified";

const ROOM_ANALYSIS_INSTRUCTIONS: &str = r#"Analyze this room image and provide a detailed assessment.

{preferences}

Please analyze the room and provide your response as a JSON object with the following structure:
{
    "room_type": "type of room (e.g., living room, bedroom, kitchen)",
    "current_style": "current design style of the room",
    "estimated_dimensions": "rough estimate of room size if possible",
    "existing_furniture": ["list", "of", "furniture", "items"],
    "lighting_assessment": "assessment of natural and artificial lighting",
    "color_palette": ["current", "color", "palette"],
    "strengths": ["positive", "aspects", "of", "the", "room"],
    "improvement_opportunities": ["areas", "that", "could", "be", "improved"]
}

Be specific and actionable in your analysis. Focus on practical observations that can inform design recommendations."#;

const RECOMMENDATION_INSTRUCTIONS: &str = r#"Based on the room analysis below, provide detailed design recommendations.

Room Analysis:
{room_analysis}

{preferences}

Please provide 3-5 prioritized recommendations as a JSON array. Each recommendation should follow this structure:
{
    "category": "furniture/lighting/colors/decor/layout/storage",
    "current_state": "what currently exists",
    "recommendation": "specific actionable recommendation",
    "priority": "high/medium/low",
    "estimated_cost": "cost range like '$100-300' or 'low/medium/high'",
    "product_suggestions": ["specific", "product", "suggestions"],
    "image_edit_prompt": "a detailed prompt for an AI image generator to visualize this change - describe exactly what should change in the room while keeping everything else the same"
}

Focus on practical, achievable improvements that match the user's style and budget. For the image_edit_prompt, be very specific about what should change (e.g., "Replace the old brown leather couch with a modern gray L-shaped sectional sofa, keep all other furniture and room elements exactly the same")."#;

const SUMMARY_INSTRUCTIONS: &str = r#"Based on the room analysis and recommendations below, write a brief executive summary (2-3 paragraphs) that:
1. Highlights the key strengths of the current space
2. Identifies the top 2-3 priorities for improvement
3. Provides an overall vision for the redesigned space

Room Analysis:
{room_analysis}

Recommendations:
{recommendations}

{preferences}

Write the summary in a warm, encouraging tone that helps the user feel excited about their design project."#;

fn or_not_specified(value: Option<&str>) -> &str {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_SPECIFIED)
}

/// Render the preference block shared by every prompt.
pub fn preferences_block(preferences: &DesignPreferences) -> String {
    let colors = preferences
        .color_preferences
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let budget = preferences.budget.map(|b| b.as_str());

    format!(
        "User Preferences:\n- Style preference: {}\n- Budget: {}\n- Preferred colors: {}\n- Specific needs: {}",
        or_not_specified(preferences.style.as_deref()),
        or_not_specified(budget),
        or_not_specified(Some(colors.as_str())),
        or_not_specified(preferences.specific_needs.as_deref()),
    )
}

pub fn room_analysis_prompt(image_path: &Path, preferences: &DesignPreferences) -> String {
    format!(
        "Read the image file at {} and analyze it.\n\n{}\n\nImportant: Return ONLY the JSON object, no additional text.",
        image_path.display(),
        ROOM_ANALYSIS_INSTRUCTIONS.replace("{preferences}", &preferences_block(preferences)),
    )
}

pub fn recommendations_prompt(analysis: &RoomAnalysis, preferences: &DesignPreferences) -> String {
    let body = RECOMMENDATION_INSTRUCTIONS
        .replace("{room_analysis}", &to_pretty_json(analysis))
        .replace("{preferences}", &preferences_block(preferences));
    format!("{}\n\nImportant: Return ONLY the JSON array, no additional text.", body)
}

pub fn summary_prompt(
    analysis: &RoomAnalysis,
    recommendations: &[DesignRecommendation],
    preferences: &DesignPreferences,
) -> String {
    SUMMARY_INSTRUCTIONS
        .replace("{room_analysis}", &to_pretty_json(analysis))
        .replace("{recommendations}", &to_pretty_json(recommendations))
        .replace("{preferences}", &preferences_block(preferences))
}

/// Wrap a recommendation's edit prompt so the generator preserves the room's structure.
pub fn image_edit_instruction(edit_prompt: &str) -> String {
    format!(
        "Edit this room image according to the following instructions.\n\
         Keep the room structure, walls, windows, and floor exactly the same.\n\
         Only modify what is specifically requested:\n\n\
         {}\n\n\
         Maintain photorealistic quality and natural lighting.",
        edit_prompt.trim()
    )
}

fn to_pretty_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    // Serializing plain structs of strings cannot fail.
    serde_json::to_string_pretty(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Budget;

    #[test]
    fn missing_preferences_render_as_not_specified() {
        let block = preferences_block(&DesignPreferences::default());
        assert_eq!(block.matches("not specified").count(), 4);
    }

    #[test]
    fn present_preferences_are_embedded() {
        let prefs = DesignPreferences {
            style: Some("modern".into()),
            budget: Some(Budget::Medium),
            color_preferences: vec!["sage".into(), " ".into(), "cream".into()],
            specific_needs: None,
        };
        let block = preferences_block(&prefs);
        assert!(block.contains("Style preference: modern"));
        assert!(block.contains("Budget: medium"));
        assert!(block.contains("Preferred colors: sage, cream"));
        assert!(block.contains("Specific needs: not specified"));
    }

    #[test]
    fn analysis_prompt_references_image_path() {
        let prompt = room_analysis_prompt(Path::new("/tmp/room.jpg"), &DesignPreferences::default());
        assert!(prompt.starts_with("Read the image file at /tmp/room.jpg"));
        assert!(prompt.contains("\"room_type\""));
        assert!(!prompt.contains("{preferences}"));
    }

    #[test]
    fn recommendations_prompt_embeds_analysis_json() {
        let analysis = RoomAnalysis::unknown();
        let prompt = recommendations_prompt(&analysis, &DesignPreferences::default());
        assert!(prompt.contains("\"room_type\": \"unknown\""));
        assert!(prompt.ends_with("Return ONLY the JSON array, no additional text."));
    }

    #[test]
    fn edit_instruction_wraps_prompt() {
        let text = image_edit_instruction("  Paint the walls sage green ");
        assert!(text.contains("walls, windows, and floor exactly the same"));
        assert!(text.contains("\n\nPaint the walls sage green\n\n"));
    }
}
