// src/handlers.rs
use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use bytes::BytesMut;
use futures_util::TryStreamExt;
use log::{info, warn};

use crate::errors::DesignerError;
use crate::models::*;
use crate::pipeline::RunOptions;
use crate::services::session_store::{MARKDOWN_REPORT, PDF_REPORT};
use crate::AppState;

/// Mount point for files under the output directory.
pub const OUTPUT_ROUTE: &str = "/output";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/designs", web::post().to(create_design))
            .route("/sessions", web::get().to(list_sessions))
            .route("/models", web::get().to(list_models)),
    )
    .route("/health", web::get().to(health_check));
}

/// Text fields accepted alongside the uploaded images.
#[derive(Debug, Default)]
struct DesignForm {
    preferences: DesignPreferences,
    model: Option<ModelTier>,
    generate_images: Option<bool>,
    pdf: Option<bool>,
}

impl DesignForm {
    fn set(&mut self, name: &str, value: &str) -> Result<(), DesignerError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(());
        }
        match name {
            "style" => self.preferences.style = Some(value.to_string()),
            "budget" => {
                self.preferences.budget = Some(value.parse().map_err(DesignerError::Validation)?)
            }
            "colors" => {
                self.preferences.color_preferences = value
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect()
            }
            "needs" => self.preferences.specific_needs = Some(value.to_string()),
            "model" => self.model = Some(value.parse().map_err(DesignerError::Validation)?),
            "generate_images" => self.generate_images = Some(parse_flag(name, value)?),
            "pdf" => self.pdf = Some(parse_flag(name, value)?),
            other => warn!("Ignoring unknown form field '{}'", other),
        }
        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, DesignerError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(DesignerError::Validation(format!(
            "{} must be true or false, got '{}'",
            name, value
        ))),
    }
}

/// Keep only the final path component of a client-supplied name.
fn safe_file_name(raw: &str, index: usize) -> String {
    Path::new(raw)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.starts_with('.'))
        .unwrap_or_else(|| format!("upload_{}.jpg", index + 1))
}

fn output_url(session_id: &str, file: &str) -> String {
    format!("{}/{}/{}", OUTPUT_ROUTE, session_id, file)
}

/// Upload room photos with preferences and run the whole design pipeline.
pub async fn create_design(
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let staging_dir = data.pipeline.sessions().upload_staging_dir()?;
    let result = run_design(&mut payload, &data, &staging_dir).await;

    if let Err(e) = std::fs::remove_dir_all(&staging_dir) {
        warn!("Failed to clean up {}: {}", staging_dir.display(), e);
    }
    result
}

async fn run_design(
    payload: &mut Multipart,
    data: &web::Data<AppState>,
    staging_dir: &Path,
) -> Result<HttpResponse, Error> {
    let mut form = DesignForm::default();
    let mut images: Vec<PathBuf> = Vec::new();

    while let Some(mut field) = payload.try_next().await? {
        let content_disposition = field.content_disposition();
        let filename = content_disposition.get_filename().map(str::to_string);
        let name = content_disposition.get_name().unwrap_or_default().to_string();

        let mut buffer = BytesMut::new();
        while let Some(chunk) = field.try_next().await? {
            buffer.extend_from_slice(&chunk);
        }

        match filename {
            Some(filename) => {
                data.image_processor.validate_image(&buffer)?;
                let path = staging_dir.join(safe_file_name(&filename, images.len()));
                std::fs::write(&path, &buffer).map_err(DesignerError::from)?;
                images.push(path);
            }
            None => {
                let value = String::from_utf8_lossy(&buffer);
                form.set(&name, &value)?;
            }
        }
    }

    if images.is_empty() {
        return Err(DesignerError::Validation("Upload at least one room image".to_string()).into());
    }

    let options = RunOptions {
        model: form.model.unwrap_or(data.default_model),
        generate_images: form.generate_images.unwrap_or(true),
        include_pdf: form.pdf.unwrap_or(false),
    };

    let mut progress = |message: &str| info!("[design] {}", message);
    let output = data
        .pipeline
        .run(&images, &form.preferences, options, &mut progress)
        .await?;

    let session_id = output.report.session_id.clone();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "session_id": session_id,
        "report": output.report,
        "files": {
            "markdown": output_url(&session_id, MARKDOWN_REPORT),
            "pdf": output.files.pdf.as_ref().map(|_| output_url(&session_id, PDF_REPORT)),
        }
    })))
}

pub async fn list_sessions(data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let sessions = data.pipeline.sessions().list_sessions()?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "count": sessions.len(),
        "sessions": sessions,
    })))
}

pub async fn list_models(data: web::Data<AppState>) -> HttpResponse {
    let models: Vec<_> = ModelTier::ALL
        .iter()
        .map(|tier| {
            serde_json::json!({
                "name": tier.as_str(),
                "description": tier.description(),
                "default": *tier == data.default_model,
            })
        })
        .collect();

    HttpResponse::Ok().json(serde_json::json!({ "models": models }))
}

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "interior-designer",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
