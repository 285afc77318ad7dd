//! Analysis report types.
//!
//! An [`AnalysisResult`] is produced by the backend at the end of a streaming
//! session and is treated as an immutable value by the client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Difficulty rating attached to focus areas and practice questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        write!(f, "{}", s)
    }
}

/// Source backing a single insight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub domain: String,
    pub url: String,
}

/// A single sourced statement, used for company intel and tech points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<Citation>,
}

impl Insight {
    /// Creates an insight without a citation.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            citation: None,
        }
    }

    /// Attaches a citation.
    pub fn with_citation(mut self, citation: Citation) -> Self {
        self.citation = Some(citation);
        self
    }
}

/// Analysis of one technology named in the job description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechTopic {
    pub name: String,
    pub points: Vec<Insight>,
}

/// A topic the interview is likely to concentrate on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusArea {
    pub topic: String,
    pub difficulty: Difficulty,
    pub description: String,
}

/// A practice question with a hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub difficulty: Difficulty,
    pub category: String,
    pub hint: String,
}

/// An external study resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub domain: String,
    pub url: String,
    pub description: String,
}

/// The complete interview preparation report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Company the job description belongs to.
    pub company_name: String,

    #[serde(default)]
    pub company_intelligence: Vec<Insight>,

    #[serde(default)]
    pub tech_analysis: Vec<TechTopic>,

    #[serde(default)]
    pub interview_focus: Vec<FocusArea>,

    #[serde(default)]
    pub practice_questions: Vec<Question>,

    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl AnalysisResult {
    /// Creates an empty report for the given company.
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            company_intelligence: Vec::new(),
            tech_analysis: Vec::new(),
            interview_focus: Vec::new(),
            practice_questions: Vec::new(),
            resources: Vec::new(),
        }
    }
}
