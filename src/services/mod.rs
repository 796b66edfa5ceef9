// src/services/mod.rs
pub mod decoder;
pub mod extractor;
pub mod image_gen;
pub mod image_processor;
pub mod llm_service;
pub mod session_store;

pub use image_gen::{ImageGenerator, OpenRouterImageService};
pub use image_processor::ImageProcessor;
pub use llm_service::{ClaudeCli, LanguageModel, LlmService};
pub use session_store::SessionStore;
