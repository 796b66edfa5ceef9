// src/lib.rs
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod services;

use std::sync::Arc;

use log::info;

use crate::config::Settings;
use crate::models::ModelTier;
use crate::pipeline::DesignPipeline;
use crate::services::{
    ClaudeCli, ImageGenerator, ImageProcessor, LlmService, OpenRouterImageService, SessionStore,
};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DesignPipeline>,
    pub image_processor: Arc<ImageProcessor>,
    pub default_model: ModelTier,
}

impl AppState {
    pub fn from_settings(settings: &Settings) -> Self {
        let image_processor = Arc::new(ImageProcessor::new(settings.max_image_dimension));
        Self {
            pipeline: Arc::new(build_pipeline(settings, image_processor.clone())),
            image_processor,
            default_model: settings.claude_model,
        }
    }
}

/// Wire the pipeline to the Claude CLI and the OpenRouter image service.
pub fn build_pipeline(settings: &Settings, image_processor: Arc<ImageProcessor>) -> DesignPipeline {
    let llm = LlmService::new(Arc::new(ClaudeCli::new(
        settings.claude_binary.clone(),
        settings.claude_timeout,
    )));
    let images = OpenRouterImageService::new(settings, image_processor);
    if images.is_available() {
        info!("Visualizations enabled with {}", images.model());
    } else {
        info!("No image-generation credential; visualizations disabled");
    }

    DesignPipeline::new(llm, Arc::new(images), SessionStore::new(&settings.output_dir))
}
