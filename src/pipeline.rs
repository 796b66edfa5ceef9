// src/pipeline.rs
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};

use crate::errors::DesignerError;
use crate::models::*;
use crate::report::{self, ReportFiles};
use crate::services::image_gen::{ImageGenerator, VariationRequest};
use crate::services::llm_service::LlmService;
use crate::services::session_store::{Session, SessionStore};

/// Leading characters of a recommendation kept in a visualization caption.
const DESCRIPTION_CHARS: usize = 50;

/// Per-run switches.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub model: ModelTier,
    pub generate_images: bool,
    pub include_pdf: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            model: ModelTier::Sonnet,
            generate_images: true,
            include_pdf: false,
        }
    }
}

/// A finished run: the report plus where it was written.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub report: DesignReport,
    pub session_dir: PathBuf,
    pub files: ReportFiles,
}

/// Human-readable status updates, called synchronously between stages.
pub type Progress<'a> = &'a mut (dyn FnMut(&str) + Send);

pub struct DesignPipeline {
    llm: LlmService,
    image_service: Arc<dyn ImageGenerator>,
    sessions: SessionStore,
}

impl DesignPipeline {
    pub fn new(llm: LlmService, image_service: Arc<dyn ImageGenerator>, sessions: SessionStore) -> Self {
        Self {
            llm,
            image_service,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Analysis, recommendations, visualization, summary, report; in that
    /// order, one pass. Any stage error except visualization ends the run.
    pub async fn run(
        &self,
        images: &[PathBuf],
        preferences: &DesignPreferences,
        options: RunOptions,
        progress: Progress<'_>,
    ) -> Result<PipelineOutput, DesignerError> {
        if images.is_empty() {
            return Err(DesignerError::Validation("At least one room image is required".to_string()));
        }

        progress("Creating session...");
        let session = self.sessions.create_session()?;
        let originals = self.sessions.stage_originals(&session, images)?;

        let room_analyses = self.analyze_rooms(&originals, preferences, options, progress).await?;
        let recommendations = self
            .recommend(&room_analyses, preferences, options, progress)
            .await?;

        let generated_images = if !options.generate_images {
            Vec::new()
        } else if !self.image_service.is_available() {
            info!("Image generation not configured; skipping visualizations");
            Vec::new()
        } else {
            progress("Generating room visualizations...");
            self.visualize(&originals[0], &recommendations, &session).await
        };

        progress("Generating summary...");
        let unknown = RoomAnalysis::unknown();
        let summary = self
            .llm
            .generate_summary(
                room_analyses.first().unwrap_or(&unknown),
                &recommendations,
                preferences,
                options.model,
            )
            .await?;

        let report = report::assemble_report(
            &session,
            originals,
            room_analyses,
            recommendations,
            generated_images,
            summary,
        );

        progress("Saving report...");
        let files = report::save_report(&report, &session, options.include_pdf)?;

        info!(
            "Session {} complete: {} rooms, {} recommendations, {} visualizations",
            report.session_id,
            report.room_analyses.len(),
            report.recommendations.len(),
            report.generated_images.len()
        );
        progress("Complete!");

        Ok(PipelineOutput {
            report,
            session_dir: session.dir,
            files,
        })
    }

    async fn analyze_rooms(
        &self,
        images: &[PathBuf],
        preferences: &DesignPreferences,
        options: RunOptions,
        progress: Progress<'_>,
    ) -> Result<Vec<RoomAnalysis>, DesignerError> {
        let mut analyses = Vec::with_capacity(images.len());
        for (i, image) in images.iter().enumerate() {
            progress(&format!("Analyzing room {} of {}...", i + 1, images.len()));
            let analysis = self.llm.analyze_room(image, preferences, options.model).await?;
            analyses.push(analysis);
        }
        Ok(analyses)
    }

    async fn recommend(
        &self,
        analyses: &[RoomAnalysis],
        preferences: &DesignPreferences,
        options: RunOptions,
        progress: Progress<'_>,
    ) -> Result<Vec<DesignRecommendation>, DesignerError> {
        let mut all = Vec::new();
        for (i, analysis) in analyses.iter().enumerate() {
            progress(&format!("Generating recommendations for room {}...", i + 1));
            let recommendations = self
                .llm
                .generate_recommendations(analysis, preferences, options.model)
                .await?;
            all.extend(recommendations);
        }
        Ok(all)
    }

    /// Every eligible recommendation is rendered against the first uploaded
    /// image, whichever room it came from. Failures are logged and dropped.
    async fn visualize(
        &self,
        base_image: &Path,
        recommendations: &[DesignRecommendation],
        session: &Session,
    ) -> Vec<GeneratedImage> {
        let mut outcomes: Vec<Result<GeneratedImage, DesignerError>> = Vec::new();

        let eligible = recommendations.iter().filter(|r| r.is_visualizable());
        for (n, rec) in eligible.enumerate() {
            let request = variation_request(n + 1, rec, base_image, session);
            outcomes.push(self.image_service.generate_variation(&request).await);
        }

        outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                Ok(image) => Some(image),
                Err(e) => {
                    warn!("Image generation failed: {}", e);
                    None
                }
            })
            .collect()
    }
}

fn variation_request(
    index: usize,
    rec: &DesignRecommendation,
    base_image: &Path,
    session: &Session,
) -> VariationRequest {
    let stem = base_image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "room".to_string());

    VariationRequest {
        base_image: base_image.to_path_buf(),
        edit_prompt: rec.image_edit_prompt.clone().unwrap_or_default(),
        output_path: session
            .generated_dir()
            .join(format!("generated_{}_{}.png", index, stem)),
        description: format!(
            "{} - {}...",
            title_case(&rec.category),
            rec.recommendation.chars().take(DESCRIPTION_CHARS).collect::<String>()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variation_request_names_output_by_position() {
        let session = Session {
            id: "20240101_000000".into(),
            dir: PathBuf::from("/out/20240101_000000"),
        };
        let rec = DesignRecommendation {
            category: "wall color".into(),
            current_state: "beige".into(),
            recommendation: "Paint the accent wall a deep forest green to anchor the seating area".into(),
            priority: Priority::High,
            estimated_cost: None,
            product_suggestions: vec![],
            image_edit_prompt: Some("Paint the wall behind the sofa forest green".into()),
        };

        let request = variation_request(2, &rec, Path::new("/out/20240101_000000/original/den.jpg"), &session);
        assert_eq!(
            request.output_path,
            PathBuf::from("/out/20240101_000000/generated/generated_2_den.png")
        );
        assert_eq!(
            request.description,
            "Wall Color - Paint the accent wall a deep forest green to ancho..."
        );
        assert_eq!(request.edit_prompt, "Paint the wall behind the sofa forest green");
    }

    #[test]
    fn short_recommendations_still_get_an_ellipsis() {
        let session = Session {
            id: "20240101_000000".into(),
            dir: PathBuf::from("/out/20240101_000000"),
        };
        let rec = DesignRecommendation {
            category: "decor".into(),
            current_state: "bare".into(),
            recommendation: "Add a rug".into(),
            priority: Priority::High,
            estimated_cost: None,
            product_suggestions: vec![],
            image_edit_prompt: Some("Add a wool rug".into()),
        };

        let request = variation_request(1, &rec, Path::new("/tmp/den.jpg"), &session);
        assert_eq!(request.description, "Decor - Add a rug...");
    }
}
