// src/services/image_gen.rs
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use log::{debug, info};
use reqwest::Client;
use serde_json::{Value, json};

use crate::config::Settings;
use crate::errors::{DesignerError, truncate_chars};
use crate::models::GeneratedImage;
use crate::prompts::image_edit_instruction;
use crate::services::image_processor::ImageProcessor;

/// One image edit to perform.
#[derive(Debug, Clone)]
pub struct VariationRequest {
    pub base_image: PathBuf,
    pub edit_prompt: String,
    pub output_path: PathBuf,
    pub description: String,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// False when no credential is configured; the visualization stage is skipped.
    fn is_available(&self) -> bool;

    async fn generate_variation(
        &self,
        request: &VariationRequest,
    ) -> Result<GeneratedImage, DesignerError>;
}

/// Chat-completions style image editing through OpenRouter.
pub struct OpenRouterImageService {
    api_key: Option<String>,
    available: bool,
    model: String,
    base_url: String,
    client: Client,
    image_processor: Arc<ImageProcessor>,
}

impl OpenRouterImageService {
    pub fn new(settings: &Settings, image_processor: Arc<ImageProcessor>) -> Self {
        Self {
            api_key: settings.openrouter_api_key.clone(),
            available: settings.has_image_credentials(),
            model: settings.openrouter_image_model.clone(),
            base_url: settings.openrouter_base_url.clone(),
            client: Client::new(),
            image_processor,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, instruction: &str, base64_image: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "text",
                        "text": instruction
                    },
                    {
                        "type": "image_url",
                        "image_url": {
                            "url": format!("data:image/jpeg;base64,{}", base64_image)
                        }
                    }
                ]
            }],
            "modalities": ["image", "text"]
        })
    }
}

#[async_trait]
impl ImageGenerator for OpenRouterImageService {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn generate_variation(
        &self,
        request: &VariationRequest,
    ) -> Result<GeneratedImage, DesignerError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|_| self.available)
            .ok_or_else(|| DesignerError::Visualization("OpenRouter API key not configured".to_string()))?;

        let base64_image = self
            .image_processor
            .encode_for_api(&request.base_image)
            .map_err(|e| DesignerError::Visualization(e.to_string()))?;
        debug!(
            "Encoded {} for {} (longest edge <= {} px)",
            request.base_image.display(),
            self.model,
            self.image_processor.max_dimension()
        );
        let instruction = image_edit_instruction(&request.edit_prompt);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("HTTP-Referer", "https://interior-designer.local")
            .header("X-Title", "Interior Designer AI")
            .json(&self.request_body(&instruction, &base64_image))
            .send()
            .await
            .map_err(|e| DesignerError::Visualization(format!("OpenRouter request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DesignerError::Visualization(format!(
                "OpenRouter error ({}): {}",
                status, error_text
            )));
        }

        let result: Value = response.json().await.map_err(|e| {
            DesignerError::Visualization(format!("Failed to parse OpenRouter response: {}", e))
        })?;

        let image_bytes = extract_image(&result)?.ok_or_else(|| {
            DesignerError::Visualization(format!(
                "Could not extract image from response. Model: {}. Response: {}",
                self.model,
                truncate_chars(&result.to_string(), 500)
            ))
        })?;

        write_image(&request.output_path, &image_bytes)?;
        info!(
            "Saved visualization to {} ({} bytes)",
            request.output_path.display(),
            image_bytes.len()
        );

        Ok(GeneratedImage {
            path: request.output_path.clone(),
            prompt_used: request.edit_prompt.clone(),
            description: request.description.clone(),
        })
    }
}

type ImageProbe = fn(&Value) -> Option<String>;

/// Places a provider may put the generated image, most specific first.
/// Each probe returns the base64 payload it found.
const IMAGE_PROBES: &[(&str, ImageProbe)] = &[
    ("message.images", images_attribute),
    ("content image_url", content_image_url),
    ("content b64_json", content_inline_base64),
];

/// Run the probes over every choice; the first payload found is decoded.
pub fn extract_image(response: &Value) -> Result<Option<Vec<u8>>, DesignerError> {
    let choices = response["choices"].as_array().map(Vec::as_slice).unwrap_or(&[]);

    let found = choices.iter().find_map(|choice| {
        let message = &choice["message"];
        IMAGE_PROBES.iter().find_map(|(name, probe)| {
            probe(message).map(|payload| {
                debug!("Image located via {}", name);
                payload
            })
        })
    });

    found
        .map(|payload| {
            // Providers may wrap long payloads across lines.
            let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| DesignerError::Visualization(format!("Invalid base64 image data: {}", e)))
        })
        .transpose()
}

fn images_attribute(message: &Value) -> Option<String> {
    message["images"].as_array()?.iter().find_map(|img| {
        let url = &img["image_url"];
        let url = url["url"].as_str().or_else(|| url.as_str())?;
        data_uri_payload(url)
    })
}

fn content_image_url(message: &Value) -> Option<String> {
    message["content"].as_array()?.iter().find_map(|item| {
        if item["type"].as_str()? != "image_url" {
            return None;
        }
        data_uri_payload(item["image_url"]["url"].as_str()?)
    })
}

fn content_inline_base64(message: &Value) -> Option<String> {
    message["content"].as_array()?.iter().find_map(|item| {
        if item["type"].as_str()? != "image" {
            return None;
        }
        item["b64_json"].as_str().map(str::to_string)
    })
}

fn data_uri_payload(url: &str) -> Option<String> {
    if !url.starts_with("data:") {
        return None;
    }
    url.split_once(',').map(|(_, data)| data.to_string())
}

fn write_image(path: &Path, bytes: &[u8]) -> Result<(), DesignerError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| DesignerError::Visualization(format!("Failed to create {}: {}", parent.display(), e)))?;
    }
    std::fs::write(path, bytes)
        .map_err(|e| DesignerError::Visualization(format!("Failed to write {}: {}", path.display(), e)))
}
