// src/errors.rs
use std::time::Duration;

use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Maximum number of characters of a raw LLM response kept inside a parse error.
pub const RAW_RESPONSE_PREVIEW: usize = 500;

#[derive(Error, Debug)]
pub enum DesignerError {
    #[error("LLM collaborator timed out after {0:?}")]
    CollaboratorTimeout(Duration),

    #[error("LLM collaborator failed: {0}")]
    CollaboratorFailure(String),

    #[error("Failed to parse {context}: {message}\nResponse: {raw}")]
    Parse {
        context: String,
        message: String,
        raw: String,
    },

    #[error("Image generation failed: {0}")]
    Visualization(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Report rendering error: {0}")]
    Render(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DesignerError {
    /// Build a parse error that carries a bounded preview of the raw response.
    pub fn parse(context: &str, message: impl Into<String>, raw: &str) -> Self {
        DesignerError::Parse {
            context: context.to_string(),
            message: message.into(),
            raw: truncate_chars(raw, RAW_RESPONSE_PREVIEW),
        }
    }
}

impl From<std::io::Error> for DesignerError {
    fn from(err: std::io::Error) -> Self {
        DesignerError::Storage(err.to_string())
    }
}

/// Truncate on a char boundary, appending an ellipsis when something was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

impl ResponseError for DesignerError {
    fn error_response(&self) -> HttpResponse {
        match self {
            DesignerError::CollaboratorTimeout(_) | DesignerError::CollaboratorFailure(_) => {
                HttpResponse::ServiceUnavailable().json(serde_json::json!({
                    "error": "AI service error",
                    "message": self.to_string()
                }))
            }
            DesignerError::Parse { .. } => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "AI response could not be parsed",
                    "message": self.to_string()
                }))
            }
            DesignerError::Visualization(_) => HttpResponse::BadGateway().json(serde_json::json!({
                "error": "Image generation error",
                "message": self.to_string()
            })),
            DesignerError::ImageProcessing(_) => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "Image processing error",
                    "message": self.to_string()
                }))
            }
            DesignerError::Storage(_) | DesignerError::Render(_) | DesignerError::Config(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Internal error",
                    "message": self.to_string()
                }))
            }
            DesignerError::Validation(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Validation error",
                "message": self.to_string()
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_truncates_raw_response() {
        let raw = "x".repeat(2000);
        let err = DesignerError::parse("room analysis", "expected value", &raw);
        match err {
            DesignerError::Parse { raw, context, .. } => {
                assert_eq!(context, "room analysis");
                assert_eq!(raw.chars().count(), RAW_RESPONSE_PREVIEW + 3);
                assert!(raw.ends_with("..."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll...");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            DesignerError::CollaboratorTimeout(Duration::from_secs(300)).error_response().status(),
            actix_web::http::StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            DesignerError::Validation("no images".into())
                .error_response()
                .status(),
            actix_web::http::StatusCode::BAD_REQUEST
        );
    }
}
