//! Streaming step types.

use serde::{Deserialize, Serialize};

/// Status of a pipeline step while an analysis streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    Active,
    Done,
}

/// Step definition as announced by the backend, before any status is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTemplate {
    pub emoji: String,
    pub text: String,
}

/// A pipeline step with its current status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub emoji: String,
    pub text: String,
    pub status: StepStatus,
}

impl Step {
    /// Creates a pending step.
    pub fn pending(emoji: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            emoji: emoji.into(),
            text: text.into(),
            status: StepStatus::Pending,
        }
    }
}

impl From<StepTemplate> for Step {
    fn from(template: StepTemplate) -> Self {
        Self::pending(template.emoji, template.text)
    }
}
