//! Analysis session state and the event reducer.
//!
//! [`AnalysisSession::apply`] is the whole event-to-state mapping. It is a
//! plain function of `(state, event)` so it can be tested without a network;
//! the controller only decides *whether* an event may be applied.

use prep_models::{AnalysisResult, Step, StepStatus};
use serde::Serialize;

use crate::event::StreamEvent;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Streaming,
    Complete,
    Error,
}

/// Where the currently loaded result came from.
///
/// Side effects such as auto-saving apply only to `Streaming` results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    #[default]
    None,
    Streaming,
    History,
}

/// Snapshot of one analysis session.
///
/// Exactly one of these holds:
/// - `state == Complete` and `result` is set
/// - `state == Error` and `error` is set
/// - `state` is `Idle` or `Streaming` and neither is set
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AnalysisSession {
    pub state: SessionState,
    pub steps: Vec<Step>,
    pub progress: u32,
    pub result: Option<AnalysisResult>,
    pub result_source: ResultSource,
    pub error: Option<String>,
}

impl AnalysisSession {
    /// A freshly started session with nothing received yet.
    pub fn streaming() -> Self {
        Self {
            state: SessionState::Streaming,
            ..Self::default()
        }
    }

    /// A completed session showing a result reopened from history.
    pub fn from_history(result: AnalysisResult) -> Self {
        Self {
            state: SessionState::Complete,
            steps: Vec::new(),
            progress: 100,
            result: Some(result),
            result_source: ResultSource::History,
            error: None,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.state == SessionState::Streaming
    }

    /// Complete or Error.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, SessionState::Complete | SessionState::Error)
    }

    /// Applies one stream event. Returns false when the event was ignored
    /// because the session is not streaming.
    pub fn apply(&mut self, event: StreamEvent) -> bool {
        if !self.is_streaming() {
            return false;
        }

        match event {
            StreamEvent::Steps { steps } => {
                self.steps = steps.into_iter().map(Step::from).collect();
            }
            StreamEvent::Progress {
                step_index,
                status,
                progress,
            } => self.advance(step_index, status, progress),
            StreamEvent::Result { data } => {
                self.result = Some(data);
                self.result_source = ResultSource::Streaming;
                self.progress = 100;
                self.state = SessionState::Complete;
            }
            StreamEvent::Error { message } => self.fail(message),
        }
        true
    }

    /// Moves the session to Error, dropping any partial result.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.result = None;
        self.result_source = ResultSource::None;
        self.state = SessionState::Error;
    }

    /// Steps before `step_index` are finished, the step at `step_index` takes
    /// `status`, later steps keep theirs. Progress is taken as sent.
    fn advance(&mut self, step_index: usize, status: StepStatus, progress: u32) {
        self.progress = progress;
        for (i, step) in self.steps.iter_mut().enumerate() {
            if i < step_index {
                step.status = StepStatus::Done;
            } else if i == step_index {
                step.status = status;
            }
        }
    }
}
