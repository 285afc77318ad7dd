//! Core data models for the interview prep client.
//!
//! This crate provides the value types shared by every layer: the analysis
//! report produced by the backend, the streaming step list shown while an
//! analysis runs, and the saved-analysis record kept in history.
//!
//! All wire types serialize with camelCase field names so they round-trip
//! against the backend and the local history file unchanged.

pub mod analysis;
pub mod saved;
pub mod step;

// Re-export main types
pub use analysis::{
    AnalysisResult, Citation, Difficulty, FocusArea, Insight, Question, Resource, TechTopic,
};
pub use saved::{role_title_for, SavedAnalysis};
pub use step::{Step, StepStatus, StepTemplate};
