//! Saved analysis records.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::AnalysisResult;

/// Returns the role title recorded for an analysis of `company_name`.
pub fn role_title_for(company_name: &str) -> String {
    format!("{} Analysis", company_name)
}

/// A completed analysis kept in history.
///
/// `saved_at` is a Unix timestamp in milliseconds, matching what the history
/// endpoint returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAnalysis {
    /// Opaque unique identifier. Assigned by the remote store when one is
    /// available, otherwise a random UUID.
    pub id: String,
    pub job_description: String,
    pub company_name: String,
    pub role_title: String,
    pub results: AnalysisResult,
    pub saved_at: i64,
}

impl SavedAnalysis {
    /// Creates a record with a fresh random id and the current time.
    pub fn new(job_description: impl Into<String>, results: AnalysisResult) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            job_description: job_description.into(),
            company_name: results.company_name.clone(),
            role_title: role_title_for(&results.company_name),
            results,
            saved_at: Utc::now().timestamp_millis(),
        }
    }
}
