// src/services/llm_service.rs
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, info};
use tokio::process::Command;

use crate::errors::DesignerError;
use crate::models::*;
use crate::prompts;
use crate::services::decoder::{decode_recommendations, decode_room_analysis};

/// Text-in, text-out language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str, model: ModelTier) -> Result<String, DesignerError>;
}

/// Runs the `claude` command line tool in print mode, one process per call.
pub struct ClaudeCli {
    binary: String,
    timeout: Duration,
}

impl ClaudeCli {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl LanguageModel for ClaudeCli {
    async fn complete(&self, prompt: &str, model: ModelTier) -> Result<String, DesignerError> {
        let start = Instant::now();

        let mut cmd = Command::new(&self.binary);
        cmd.arg("-p")
            .arg(prompt)
            .arg("--model")
            .arg(model.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| DesignerError::CollaboratorTimeout(self.timeout))?
            .map_err(|e| {
                DesignerError::CollaboratorFailure(format!("failed to start {}: {}", self.binary, e))
            })?;

        debug!(
            "{} --model {} finished in {} ms",
            self.binary,
            model,
            start.elapsed().as_millis()
        );

        classify_output(
            output.status.success(),
            output.status.code(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        )
    }
}

/// Decide whether a finished invocation succeeded. The tool can exit 0 while
/// printing an error, so the output text is checked as well.
pub fn classify_output(
    success: bool,
    code: Option<i32>,
    stdout: &str,
    stderr: &str,
) -> Result<String, DesignerError> {
    let output = stdout.trim();
    let stderr = stderr.trim();

    if !success {
        let detail = [stderr, output]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("Unknown error");
        let code = code.map_or_else(|| "signal".to_string(), |c| c.to_string());
        return Err(DesignerError::CollaboratorFailure(format!(
            "exit {}: {}",
            code, detail
        )));
    }

    if output.contains("API Error:") || output.contains("Error:") {
        return Err(DesignerError::CollaboratorFailure(format!(
            "API error: {}",
            output
        )));
    }

    Ok(output.to_string())
}

/// The three language-model stages of the pipeline.
pub struct LlmService {
    model: Arc<dyn LanguageModel>,
}

impl LlmService {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn analyze_room(
        &self,
        image_path: &Path,
        preferences: &DesignPreferences,
        tier: ModelTier,
    ) -> Result<RoomAnalysis, DesignerError> {
        let prompt = prompts::room_analysis_prompt(image_path, preferences);
        let response = self.model.complete(&prompt, tier).await?;
        debug!("Room analysis response: {}", response);

        let analysis = decode_room_analysis(&response)?;
        info!(
            "Analyzed {}: {} ({})",
            image_path.display(),
            analysis.room_type,
            analysis.current_style
        );
        Ok(analysis)
    }

    pub async fn generate_recommendations(
        &self,
        analysis: &RoomAnalysis,
        preferences: &DesignPreferences,
        tier: ModelTier,
    ) -> Result<Vec<DesignRecommendation>, DesignerError> {
        let prompt = prompts::recommendations_prompt(analysis, preferences);
        let response = self.model.complete(&prompt, tier).await?;
        debug!("Recommendations response: {}", response);

        let recommendations = decode_recommendations(&response)?;
        info!(
            "Received {} recommendations for {}",
            recommendations.len(),
            analysis.room_type
        );
        Ok(recommendations)
    }

    /// Free text, returned verbatim.
    pub async fn generate_summary(
        &self,
        analysis: &RoomAnalysis,
        recommendations: &[DesignRecommendation],
        preferences: &DesignPreferences,
        tier: ModelTier,
    ) -> Result<String, DesignerError> {
        let prompt = prompts::summary_prompt(analysis, recommendations, preferences);
        self.model.complete(&prompt, tier).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct ScriptedModel {
        reply: String,
        seen: Mutex<Vec<(String, ModelTier)>>,
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(&self, prompt: &str, model: ModelTier) -> Result<String, DesignerError> {
            self.seen.lock().unwrap().push((prompt.to_string(), model));
            Ok(self.reply.clone())
        }
    }

    fn scripted(reply: &str) -> Arc<ScriptedModel> {
        Arc::new(ScriptedModel {
            reply: reply.to_string(),
            seen: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn non_zero_exit_prefers_stderr() {
        let err = classify_output(false, Some(2), "partial", "boom").unwrap_err();
        assert_eq!(err.to_string(), "LLM collaborator failed: exit 2: boom");

        let err = classify_output(false, Some(1), "only stdout", "  ").unwrap_err();
        assert!(err.to_string().ends_with("only stdout"));

        let err = classify_output(false, None, "", "").unwrap_err();
        assert!(err.to_string().contains("exit signal: Unknown error"));
    }

    #[test]
    fn error_text_in_output_is_a_failure() {
        assert!(classify_output(true, Some(0), "API Error: 529 overloaded", "").is_err());
        assert!(classify_output(true, Some(0), "Error: invalid model", "").is_err());
    }

    #[test]
    fn clean_output_is_trimmed() {
        assert_eq!(
            classify_output(true, Some(0), "\n  {\"ok\": true}\n", "").unwrap(),
            "{\"ok\": true}"
        );
    }

    #[tokio::test]
    async fn missing_binary_is_a_collaborator_failure() {
        let cli = ClaudeCli::new("definitely-not-a-real-llm-binary", Duration::from_secs(5));
        let err = cli.complete("hello", ModelTier::Haiku).await.unwrap_err();
        assert!(matches!(err, DesignerError::CollaboratorFailure(_)));
    }

    #[cfg(unix)]
    fn fake_cli(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-claude");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_cli_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let cli = ClaudeCli::new(
            fake_cli(dir.path(), "sleep 5").display().to_string(),
            Duration::from_millis(300),
        );

        let start = Instant::now();
        let err = cli.complete("hello", ModelTier::Sonnet).await.unwrap_err();
        assert!(matches!(err, DesignerError::CollaboratorTimeout(d) if d == Duration::from_millis(300)));
        assert_eq!(err.to_string(), "LLM collaborator timed out after 300ms");
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cli_receives_prompt_and_model_flags() {
        let dir = tempfile::tempdir().unwrap();
        let cli = ClaudeCli::new(
            fake_cli(dir.path(), r#"echo "$1|$2|$3|$4""#).display().to_string(),
            Duration::from_secs(10),
        );

        let reply = cli.complete("describe the room", ModelTier::Haiku).await.unwrap();
        assert_eq!(reply, "-p|describe the room|--model|haiku");
    }

    #[tokio::test]
    async fn analysis_prompt_uses_selected_tier() {
        let model = scripted(
            r#"{"room_type": "bedroom", "current_style": "boho", "lighting_assessment": "soft"}"#,
        );
        let service = LlmService::new(model.clone());
        let analysis = service
            .analyze_room(Path::new("room.jpg"), &DesignPreferences::default(), ModelTier::Opus)
            .await
            .unwrap();

        assert_eq!(analysis.room_type, "bedroom");
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, ModelTier::Opus);
        assert!(seen[0].0.contains("room.jpg"));
    }

    #[tokio::test]
    async fn summary_is_returned_verbatim() {
        let model = scripted("Your room has great bones.\n\nStart with lighting.");
        let service = LlmService::new(model);
        let summary = service
            .generate_summary(
                &RoomAnalysis::unknown(),
                &[],
                &DesignPreferences::default(),
                ModelTier::Sonnet,
            )
            .await
            .unwrap();
        assert_eq!(summary, "Your room has great bones.\n\nStart with lighting.");
    }

    #[tokio::test]
    async fn malformed_recommendations_surface_parse_error() {
        let service = LlmService::new(scripted("no json here"));
        let err = service
            .generate_recommendations(
                &RoomAnalysis::unknown(),
                &DesignPreferences::default(),
                ModelTier::Sonnet,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DesignerError::Parse { .. }));
    }
}
