// src/models.rs
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Budget tier a user can attach to their preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Budget {
    Low,
    Medium,
    High,
}

impl Budget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Budget::Low => "low",
            Budget::Medium => "medium",
            Budget::High => "high",
        }
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Budget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Budget::Low),
            "medium" => Ok(Budget::Medium),
            "high" => Ok(Budget::High),
            other => Err(format!(
                "Budget must be low, medium, or high (got '{}')",
                other
            )),
        }
    }
}

/// Named model tiers understood by the LLM command line tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    #[default]
    Sonnet,
    Opus,
    Haiku,
}

impl ModelTier {
    pub const ALL: [ModelTier; 3] = [ModelTier::Sonnet, ModelTier::Opus, ModelTier::Haiku];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Sonnet => "sonnet",
            ModelTier::Opus => "opus",
            ModelTier::Haiku => "haiku",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ModelTier::Sonnet => "Claude Sonnet (default, balanced)",
            ModelTier::Opus => "Claude Opus (most capable)",
            ModelTier::Haiku => "Claude Haiku (fastest)",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sonnet" => Ok(ModelTier::Sonnet),
            "opus" => Ok(ModelTier::Opus),
            "haiku" => Ok(ModelTier::Haiku),
            other => Err(format!(
                "Model must be sonnet, opus, or haiku (got '{}')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignPreferences {
    pub style: Option<String>,
    pub budget: Option<Budget>,
    #[serde(default)]
    pub color_preferences: Vec<String>,
    pub specific_needs: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomAnalysis {
    pub room_type: String,
    pub current_style: String,
    #[serde(default)]
    pub estimated_dimensions: Option<String>,
    #[serde(default)]
    pub existing_furniture: Vec<String>,
    pub lighting_assessment: String,
    #[serde(default)]
    pub color_palette: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvement_opportunities: Vec<String>,
}

impl RoomAnalysis {
    /// Placeholder used for the summary when no room was analyzed.
    pub fn unknown() -> Self {
        Self {
            room_type: "unknown".to_string(),
            current_style: "unknown".to_string(),
            estimated_dimensions: None,
            existing_furniture: Vec::new(),
            lighting_assessment: "unknown".to_string(),
            color_palette: Vec::new(),
            strengths: Vec::new(),
            improvement_opportunities: Vec::new(),
        }
    }
}

/// Recommendation priority. Ordered so that `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignRecommendation {
    pub category: String,
    pub current_state: String,
    pub recommendation: String,
    pub priority: Priority,
    #[serde(default)]
    pub estimated_cost: Option<String>,
    #[serde(default)]
    pub product_suggestions: Vec<String>,
    #[serde(default)]
    pub image_edit_prompt: Option<String>,
}

impl DesignRecommendation {
    /// Only high priority recommendations with a non-blank edit prompt get visualized.
    pub fn is_visualizable(&self) -> bool {
        self.priority == Priority::High
            && self
                .image_edit_prompt
                .as_deref()
                .is_some_and(|p| !p.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub path: PathBuf,
    pub prompt_used: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignReport {
    pub session_id: String,
    pub original_images: Vec<PathBuf>,
    pub room_analyses: Vec<RoomAnalysis>,
    pub recommendations: Vec<DesignRecommendation>,
    #[serde(default)]
    pub generated_images: Vec<GeneratedImage>,
    pub summary: String,
}

/// "living room" -> "Living Room"
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
