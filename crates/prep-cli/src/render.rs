//! Plain-text rendering of sessions, reports and history entries.

use std::fmt::Write;

use chrono::{DateTime, Local};
use prep_client::AnalysisSession;
use prep_models::{AnalysisResult, Insight, SavedAnalysis, StepStatus};

/// Turns session updates into progress lines, printing only what changed.
#[derive(Debug, Default)]
pub struct ProgressPrinter {
    last: Option<(usize, StepStatus)>,
}

impl ProgressPrinter {
    /// Returns the line to print for `session`, if anything new happened.
    ///
    /// The reported step is the last one that is not pending.
    pub fn update(&mut self, session: &AnalysisSession) -> Option<String> {
        let (index, step) = session
            .steps
            .iter()
            .enumerate()
            .rev()
            .find(|(_, step)| step.status != StepStatus::Pending)?;

        let key = (index, step.status);
        if self.last == Some(key) {
            return None;
        }
        self.last = Some(key);

        let marker = match step.status {
            StepStatus::Done => "done",
            _ => "....",
        };
        Some(format!(
            "[{:>3}%] {} {} {}",
            session.progress, step.emoji, step.text, marker
        ))
    }
}

fn insight_line(out: &mut String, insight: &Insight) {
    let _ = write!(out, "  - {}", insight.text);
    if let Some(citation) = &insight.citation {
        let _ = write!(out, " ({})", citation.domain);
    }
    out.push('\n');
}

/// Renders a full report.
pub fn report(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", result.company_name);
    let _ = writeln!(out, "{}", "=".repeat(result.company_name.chars().count().max(3)));

    if !result.company_intelligence.is_empty() {
        out.push_str("\nCompany intelligence\n");
        for insight in &result.company_intelligence {
            insight_line(&mut out, insight);
        }
    }

    if !result.tech_analysis.is_empty() {
        out.push_str("\nTech analysis\n");
        for topic in &result.tech_analysis {
            let _ = writeln!(out, "  {}", topic.name);
            for point in &topic.points {
                out.push_str("  ");
                insight_line(&mut out, point);
            }
        }
    }

    if !result.interview_focus.is_empty() {
        out.push_str("\nInterview focus\n");
        for area in &result.interview_focus {
            let _ = writeln!(out, "  - [{}] {}: {}", area.difficulty, area.topic, area.description);
        }
    }

    if !result.practice_questions.is_empty() {
        out.push_str("\nPractice questions\n");
        for (i, q) in result.practice_questions.iter().enumerate() {
            let _ = writeln!(out, "  {}. [{}] {} ({})", i + 1, q.difficulty, q.question, q.category);
            let _ = writeln!(out, "     Hint: {}", q.hint);
        }
    }

    if !result.resources.is_empty() {
        out.push_str("\nResources\n");
        for resource in &result.resources {
            let _ = writeln!(out, "  - {} <{}>", resource.title, resource.url);
            if !resource.description.is_empty() {
                let _ = writeln!(out, "    {}", resource.description);
            }
        }
    }

    out
}

/// Formats a millisecond timestamp in local time.
pub fn saved_at(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// One line per history entry.
pub fn history_line(entry: &SavedAnalysis) -> String {
    format!("{}  {}  {}", entry.id, saved_at(entry.saved_at), entry.role_title)
}
