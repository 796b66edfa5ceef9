// src/report/mod.rs
//! Report assembly and rendering.

pub mod markdown;
pub mod pdf;
pub mod sanitize;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::info;
use serde::Serialize;

use crate::errors::DesignerError;
use crate::models::*;
use crate::services::session_store::Session;

pub use markdown::render_markdown;
pub use pdf::{layout_report, write_pdf};
pub use sanitize::sanitize_text;

pub const FURNITURE_PREVIEW: usize = 6;
pub const COLOR_PREVIEW: usize = 8;
pub const STRENGTH_PREVIEW: usize = 4;
pub const OPPORTUNITY_PREVIEW: usize = 4;
pub const PRODUCT_PREVIEW: usize = 4;
pub const PROMPT_PREVIEW_CHARS: usize = 200;

/// Where and when a report is rendered.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub session_dir: PathBuf,
    pub generated_at: DateTime<Local>,
}

impl RenderContext {
    pub fn new(session_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_dir: session_dir.into(),
            generated_at: Local::now(),
        }
    }

    pub fn generated_on(&self) -> String {
        self.generated_at.format("%B %d, %Y").to_string()
    }

    /// Paths inside the session directory are shown relative to it.
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.session_dir).unwrap_or(path)
    }
}

/// Files written for one report.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReportFiles {
    pub markdown: PathBuf,
    pub pdf: Option<PathBuf>,
}

/// Combine the stage outputs into the immutable report record.
pub fn assemble_report(
    session: &Session,
    original_images: Vec<PathBuf>,
    room_analyses: Vec<RoomAnalysis>,
    recommendations: Vec<DesignRecommendation>,
    generated_images: Vec<GeneratedImage>,
    summary: String,
) -> DesignReport {
    DesignReport {
        session_id: session.id.clone(),
        original_images,
        room_analyses,
        recommendations,
        generated_images,
        summary,
    }
}

/// Always writes `report.md`; writes `report.pdf` only when asked to.
pub fn save_report(
    report: &DesignReport,
    session: &Session,
    include_pdf: bool,
) -> Result<ReportFiles, DesignerError> {
    let ctx = RenderContext::new(&session.dir);

    let markdown_path = session.markdown_path();
    std::fs::write(&markdown_path, render_markdown(report, &ctx)).map_err(|e| {
        DesignerError::Storage(format!("Failed to write {}: {}", markdown_path.display(), e))
    })?;
    info!("Wrote {}", markdown_path.display());

    let pdf = if include_pdf {
        let pdf_path = session.pdf_path();
        write_pdf(&layout_report(report, &ctx), &pdf_path)?;
        info!("Wrote {}", pdf_path.display());
        Some(pdf_path)
    } else {
        None
    };

    Ok(ReportFiles {
        markdown: markdown_path,
        pdf,
    })
}

/// Canned report with typographic characters, for checking output without
/// calling any model.
pub fn sample_report(session_id: &str) -> DesignReport {
    DesignReport {
        session_id: session_id.to_string(),
        original_images: Vec::new(),
        room_analyses: vec![RoomAnalysis {
            room_type: "living room".into(),
            current_style: "Contemporary\u{2013}Transitional with clean lines".into(),
            estimated_dimensions: Some("15\u{2032} \u{00D7} 20\u{2032} \u{2014} approximately 300 sq ft".into()),
            existing_furniture: vec![
                "Gray sectional sofa".into(),
                "Light wood coffee table".into(),
                "Floor lamp".into(),
            ],
            lighting_assessment: "Good natural light from windows \u{2014} could use accent lighting".into(),
            color_palette: vec!["Warm white".into(), "Light gray".into(), "Natural wood tones".into()],
            strengths: vec!["Open floor plan".into(), "Neutral palette".into(), "Quality flooring".into()],
            improvement_opportunities: vec![
                "Add statement lighting".into(),
                "Layer textures".into(),
                "Include artwork".into(),
            ],
        }],
        recommendations: vec![
            DesignRecommendation {
                category: "lighting".into(),
                current_state: "Room relies on natural light and basic fixtures".into(),
                recommendation: "Install a modern pendant light or chandelier as a focal point \u{2014} consider dimmable options".into(),
                priority: Priority::High,
                estimated_cost: Some("$200\u{2013}$500 for quality fixture".into()),
                product_suggestions: vec!["West Elm Mobile Chandelier".into(), "CB2 Sputnik Pendant".into()],
                image_edit_prompt: None,
            },
            DesignRecommendation {
                category: "decor".into(),
                current_state: "Walls are bare with no artwork or visual interest".into(),
                recommendation: "Create a gallery wall or add large\u{2011}scale artwork above the sofa".into(),
                priority: Priority::High,
                estimated_cost: Some("$150\u{2013}$400 depending on pieces".into()),
                product_suggestions: vec!["Society6 prints".into(), "Local artist originals".into()],
                image_edit_prompt: None,
            },
            DesignRecommendation {
                category: "textiles".into(),
                current_state: "Limited soft textures in the space".into(),
                recommendation: "Add throw pillows, blankets, and an area rug to layer textures\u{2026}".into(),
                priority: Priority::Medium,
                estimated_cost: Some("$300\u{2013}$600 for complete set".into()),
                product_suggestions: vec!["Ruggable washable rugs".into(), "Pottery Barn throw pillows".into()],
                image_edit_prompt: None,
            },
        ],
        generated_images: Vec::new(),
        summary: "This living room reveals a well\u{2011}maintained space with strong foundations.\n\n\
                  The room\u{2019}s greatest assets include its open floor plan, neutral palette, and quality light wood flooring.\n\n\
                  Key recommendations focus on lighting \u{2192} ambiance, wall d\u{00E9}cor \u{2192} visual interest, and textiles \u{2192} warmth."
            .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::session_store::SessionStore;

    #[test]
    fn markdown_is_always_written_pdf_on_request() {
        let root = tempfile::tempdir().unwrap();
        let store = SessionStore::new(root.path());

        let session = store.create_session().unwrap();
        let files = save_report(&sample_report(&session.id), &session, false).unwrap();
        assert!(files.markdown.is_file());
        assert!(files.pdf.is_none());
        assert!(!session.pdf_path().exists());

        let session = store.create_session().unwrap();
        let files = save_report(&sample_report(&session.id), &session, true).unwrap();
        assert!(files.markdown.is_file());
        assert_eq!(files.pdf.as_deref(), Some(session.pdf_path().as_path()));
        assert!(session.pdf_path().is_file());
    }

    #[test]
    fn markdown_keeps_original_characters_pdf_layout_does_not() {
        let report = sample_report("20240101_000000");
        let ctx = RenderContext::new("/tmp/none");

        let md = render_markdown(&report, &ctx);
        assert!(md.contains("The room\u{2019}s greatest assets"));

        let texts: Vec<String> = layout_report(&report, &ctx)
            .iter()
            .flat_map(|p| p.texts().map(String::from).collect::<Vec<_>>())
            .collect();
        assert!(texts.iter().any(|t| t.contains("The room's greatest assets")));
    }

    #[test]
    fn relative_paths_fall_back_to_absolute() {
        let ctx = RenderContext::new("/out/session");
        assert_eq!(ctx.relative(Path::new("/out/session/generated/a.png")), Path::new("generated/a.png"));
        assert_eq!(ctx.relative(Path::new("/elsewhere/a.png")), Path::new("/elsewhere/a.png"));
    }
}
