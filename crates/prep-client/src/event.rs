//! Typed events carried by the analysis stream.

use prep_models::{AnalysisResult, StepStatus, StepTemplate};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

/// `type` tags this client understands.
const KNOWN_TYPES: [&str; 4] = ["steps", "progress", "result", "error"];

/// One server-push event of an analysis session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Announces the pipeline steps, replacing any previous list.
    Steps { steps: Vec<StepTemplate> },

    /// Advances the pipeline to `step_index`.
    #[serde(rename_all = "camelCase")]
    Progress {
        step_index: usize,
        status: StepStatus,
        progress: u32,
    },

    /// Final report.
    Result { data: AnalysisResult },

    /// Backend-reported failure.
    Error { message: String },
}

impl StreamEvent {
    /// Converts a decoded frame payload into an event.
    ///
    /// Frames with an unknown `type` are ignored, and frames with a known
    /// `type` whose fields do not match are dropped as malformed. Neither is
    /// an error for the session.
    pub fn from_frame(frame: Value) -> Option<Self> {
        let kind = frame.get("type").and_then(Value::as_str)?;
        if !KNOWN_TYPES.contains(&kind) {
            trace!(kind, "Ignoring unknown event type");
            return None;
        }

        match serde_json::from_value(frame) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!(error = %e, "Dropping malformed event");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_steps_event() {
        let event = StreamEvent::from_frame(json!({
            "type": "steps",
            "steps": [{"emoji": "⏳", "text": "Extracting job details..."}]
        }))
        .unwrap();

        match event {
            StreamEvent::Steps { steps } => {
                assert_eq!(steps.len(), 1);
                assert_eq!(steps[0].emoji, "⏳");
            }
            other => panic!("Expected Steps, got {:?}", other),
        }
    }

    #[test]
    fn test_progress_event_camel_case() {
        let event = StreamEvent::from_frame(json!({
            "type": "progress", "stepIndex": 2, "status": "done", "progress": 60
        }));

        assert_eq!(
            event,
            Some(StreamEvent::Progress {
                step_index: 2,
                status: StepStatus::Done,
                progress: 60,
            })
        );
    }

    #[test]
    fn test_result_and_error_events() {
        let result = StreamEvent::from_frame(json!({
            "type": "result",
            "data": {"companyName": "Acme"}
        }));
        assert!(matches!(result, Some(StreamEvent::Result { data }) if data.company_name == "Acme"));

        let error = StreamEvent::from_frame(json!({"type": "error", "message": "quota"}));
        assert_eq!(
            error,
            Some(StreamEvent::Error {
                message: "quota".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_type_ignored() {
        assert!(StreamEvent::from_frame(json!({"type": "heartbeat"})).is_none());
        assert!(StreamEvent::from_frame(json!({"no_type": true})).is_none());
        assert!(StreamEvent::from_frame(json!([1, 2, 3])).is_none());
    }

    #[test]
    fn test_known_type_with_bad_fields_dropped() {
        assert!(StreamEvent::from_frame(json!({"type": "progress", "stepIndex": "two"})).is_none());
        assert!(StreamEvent::from_frame(json!({"type": "steps"})).is_none());
    }
}
