// src/report/markdown.rs
use std::fmt::Write as _;

use crate::errors::truncate_chars;
use crate::models::{DesignReport, Priority, title_case};
use crate::report::{
    COLOR_PREVIEW, FURNITURE_PREVIEW, OPPORTUNITY_PREVIEW, PRODUCT_PREVIEW, PROMPT_PREVIEW_CHARS,
    RenderContext, STRENGTH_PREVIEW,
};

fn badge(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "🔴 HIGH",
        Priority::Medium => "🟡 MEDIUM",
        Priority::Low => "🟢 LOW",
    }
}

fn bullet_list(out: &mut String, heading: &str, items: &[String], limit: usize) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "**{}:**\n", heading);
    for item in items.iter().take(limit) {
        let _ = writeln!(out, "- {}", item);
    }
    out.push('\n');
}

/// Render the report as Markdown. Text is written exactly as the model produced it.
pub fn render_markdown(report: &DesignReport, ctx: &RenderContext) -> String {
    let mut out = String::new();

    out.push_str("# Interior Design Report\n\n");
    let _ = writeln!(out, "**Session:** {}  ", report.session_id);
    let _ = writeln!(out, "**Generated:** {}\n", ctx.generated_on());

    out.push_str("## Executive Summary\n\n");
    let _ = writeln!(out, "{}\n", report.summary.trim());

    if !report.room_analyses.is_empty() {
        out.push_str("## Room Analysis\n\n");
        for (i, analysis) in report.room_analyses.iter().enumerate() {
            let _ = writeln!(out, "### Room {}: {}\n", i + 1, title_case(&analysis.room_type));

            if let Some(image) = report.original_images.get(i) {
                let reference = ctx.relative(image);
                let _ = writeln!(out, "![Room {}]({})\n", i + 1, reference.display());
            }

            let _ = writeln!(out, "- **Current Style:** {}", analysis.current_style);
            if let Some(dimensions) = &analysis.estimated_dimensions {
                let _ = writeln!(out, "- **Estimated Dimensions:** {}", dimensions);
            }
            let _ = writeln!(out, "- **Lighting:** {}", analysis.lighting_assessment);
            if !analysis.color_palette.is_empty() {
                let colors: Vec<&str> = analysis
                    .color_palette
                    .iter()
                    .take(COLOR_PREVIEW)
                    .map(String::as_str)
                    .collect();
                let _ = writeln!(out, "- **Colors:** {}", colors.join(", "));
            }
            out.push('\n');

            bullet_list(&mut out, "Existing Furniture", &analysis.existing_furniture, FURNITURE_PREVIEW);
            bullet_list(&mut out, "Strengths", &analysis.strengths, STRENGTH_PREVIEW);
            bullet_list(
                &mut out,
                "Improvement Opportunities",
                &analysis.improvement_opportunities,
                OPPORTUNITY_PREVIEW,
            );
        }
    }

    if !report.recommendations.is_empty() {
        out.push_str("## Design Recommendations\n\n");
        for (i, rec) in report.recommendations.iter().enumerate() {
            let _ = writeln!(out, "### {}. {}\n", i + 1, title_case(&rec.category));
            let _ = writeln!(out, "**Priority:** {}\n", badge(rec.priority));
            let _ = writeln!(out, "**Current State:** {}\n", rec.current_state);
            let _ = writeln!(out, "**Recommendation:** {}\n", rec.recommendation);
            if let Some(cost) = &rec.estimated_cost {
                let _ = writeln!(out, "**Estimated Cost:** {}\n", cost);
            }
            bullet_list(&mut out, "Suggested Products", &rec.product_suggestions, PRODUCT_PREVIEW);
        }
    }

    if !report.generated_images.is_empty() {
        out.push_str("## AI-Generated Visualizations\n\n");
        for image in &report.generated_images {
            let reference = ctx.relative(&image.path);
            let _ = writeln!(out, "### {}\n", image.description);
            let _ = writeln!(out, "![{}]({})\n", image.description, reference.display());
            let _ = writeln!(
                out,
                "*Prompt: {}*\n",
                truncate_chars(&image.prompt_used, PROMPT_PREVIEW_CHARS)
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DesignRecommendation, GeneratedImage, RoomAnalysis};
    use chrono::{Local, TimeZone};
    use std::path::PathBuf;

    fn context() -> RenderContext {
        RenderContext {
            session_dir: PathBuf::from("/out/20240102_030405"),
            generated_at: Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    fn report() -> DesignReport {
        DesignReport {
            session_id: "20240102_030405".into(),
            original_images: vec![PathBuf::from("/out/20240102_030405/original/room.jpg")],
            room_analyses: vec![RoomAnalysis {
                room_type: "living room".into(),
                current_style: "Contemporary \u{2014} transitional".into(),
                estimated_dimensions: Some("15' \u{00D7} 20'".into()),
                existing_furniture: (1..=8).map(|i| format!("item {}", i)).collect(),
                lighting_assessment: "Good natural light".into(),
                color_palette: vec!["white".into(), "oak".into()],
                strengths: vec!["Open plan".into()],
                improvement_opportunities: vec![],
            }],
            recommendations: vec![DesignRecommendation {
                category: "lighting".into(),
                current_state: "Basic fixtures".into(),
                recommendation: "Add a pendant".into(),
                priority: Priority::High,
                estimated_cost: Some("$200-$500".into()),
                product_suggestions: vec!["Sputnik pendant".into()],
                image_edit_prompt: Some("Add pendant".into()),
            }],
            generated_images: vec![GeneratedImage {
                path: PathBuf::from("/out/20240102_030405/generated/generated_1_room.png"),
                prompt_used: "p".repeat(300),
                description: "Lighting - Add a pendant...".into(),
            }],
            summary: "It's a 10\u{00B0} turn \u{2014} nice\u{2026}".into(),
        }
    }

    #[test]
    fn sections_appear_in_order_with_fixed_heading_levels() {
        let md = render_markdown(&report(), &context());
        let order = [
            "# Interior Design Report",
            "**Session:** 20240102_030405",
            "**Generated:** January 02, 2024",
            "## Executive Summary",
            "## Room Analysis",
            "### Room 1: Living Room",
            "## Design Recommendations",
            "### 1. Lighting",
            "## AI-Generated Visualizations",
            "### Lighting - Add a pendant...",
        ];
        let mut cursor = 0;
        for heading in order {
            let found = md[cursor..].find(heading).unwrap_or_else(|| panic!("missing {heading}"));
            cursor += found + heading.len();
        }
    }

    #[test]
    fn unicode_is_preserved() {
        let md = render_markdown(&report(), &context());
        assert!(md.contains("It's a 10\u{00B0} turn \u{2014} nice\u{2026}"));
        assert!(md.contains("15' \u{00D7} 20'"));
    }

    #[test]
    fn lists_and_prompts_are_truncated() {
        let md = render_markdown(&report(), &context());
        assert!(md.contains("- item 6"));
        assert!(!md.contains("- item 7"));
        let prompt_line = md.lines().find(|l| l.starts_with("*Prompt: ")).unwrap();
        assert_eq!(prompt_line, format!("*Prompt: {}...*", "p".repeat(200)));
    }

    #[test]
    fn file_references_are_relative_to_the_session() {
        let md = render_markdown(&report(), &context());
        assert!(md.contains("(generated/generated_1_room.png)"));
        assert!(md.contains("![Room 1](original/room.jpg)"));
        assert!(md.contains("**Priority:** 🔴 HIGH"));
    }

    #[test]
    fn empty_sections_are_omitted() {
        let mut bare = report();
        bare.room_analyses.clear();
        bare.recommendations.clear();
        bare.generated_images.clear();
        let md = render_markdown(&bare, &context());
        assert!(md.contains("## Executive Summary"));
        assert!(!md.contains("## Room Analysis"));
        assert!(!md.contains("## Design Recommendations"));
        assert!(!md.contains("## AI-Generated Visualizations"));
    }
}
