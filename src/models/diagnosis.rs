//! Diagnosis model

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Action the model may recommend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendedAction {
    Restart,
    ScaleOut,
    Ignore,
}

impl RecommendedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendedAction::Restart => "RESTART",
            RecommendedAction::ScaleOut => "SCALE_OUT",
            RecommendedAction::Ignore => "IGNORE",
        }
    }
}

impl std::fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendedAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "RESTART" => Ok(RecommendedAction::Restart),
            "SCALE_OUT" => Ok(RecommendedAction::ScaleOut),
            "IGNORE" => Ok(RecommendedAction::Ignore),
            _ => Err(format!("unknown action: {}", s)),
        }
    }
}

/// Normalized backend answer.
///
/// Every field is optional because backends fail in different ways: a
/// transport failure only sets `error`, unparsable model output only sets
/// `diagnosis`. An absent `recommended_action` means IGNORE.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_action: Option<RecommendedAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DiagnosisResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn free_text(text: impl Into<String>) -> Self {
        Self {
            diagnosis: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn action(&self) -> RecommendedAction {
        self.recommended_action.unwrap_or(RecommendedAction::Ignore)
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn root_cause_or_default(&self) -> &str {
        self.root_cause.as_deref().unwrap_or("Unknown")
    }

    pub fn justification_or_default(&self) -> &str {
        self.justification.as_deref().unwrap_or("No justification provided.")
    }

    /// Fill in the implicit IGNORE so callers always see an action
    pub fn normalized(mut self) -> Self {
        self.recommended_action = Some(self.action());
        self
    }
}
