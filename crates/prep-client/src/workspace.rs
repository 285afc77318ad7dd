//! Ties the session controller, history and draft together.
//!
//! A streamed analysis that completes is saved to history exactly once. A
//! result reopened from history is shown without being saved again.

use std::path::PathBuf;
use std::sync::Arc;

use prep_models::SavedAnalysis;
use prep_persistence::{DeviceStore, DraftStore};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::controller::SessionController;
use crate::history::HistoryGateway;
use crate::session::{ResultSource, SessionState};
use crate::transport::HttpTransport;

/// One user's working set: the current session, the draft and history.
pub struct Workspace {
    controller: SessionController,
    gateway: Arc<HistoryGateway>,
    draft: DraftStore,
    loaded_from_history: bool,
    auto_saved: bool,
}

impl Workspace {
    pub fn new(controller: SessionController, gateway: Arc<HistoryGateway>, draft: DraftStore) -> Self {
        Self {
            controller,
            gateway,
            draft,
            loaded_from_history: false,
            auto_saved: false,
        }
    }

    /// Wires up the HTTP backend at `config` and device storage in
    /// `state_dir`.
    pub fn open(config: &ClientConfig, state_dir: impl Into<PathBuf>) -> Self {
        let store = DeviceStore::new(state_dir);
        let transport = Arc::new(HttpTransport::new(config.clone()));
        let gateway = Arc::new(HistoryGateway::from_config(config, store.clone()));

        Self::new(
            SessionController::new(transport),
            gateway,
            DraftStore::load(store),
        )
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn gateway(&self) -> &Arc<HistoryGateway> {
        &self.gateway
    }

    pub fn draft(&self) -> &str {
        self.draft.get()
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft.set(text);
    }

    pub fn clear_draft(&mut self) {
        self.draft.clear();
    }

    /// Runs an analysis of `job_description` and saves the result if it
    /// completes. Returns the saved record.
    ///
    /// Does nothing while another analysis is streaming.
    pub async fn analyze(&mut self, job_description: &str) -> Option<SavedAnalysis> {
        if self.controller.snapshot().is_streaming() {
            debug!("Analysis already streaming, ignoring request");
            return None;
        }

        self.draft.set(job_description);
        self.loaded_from_history = false;
        self.auto_saved = false;

        self.controller.analyze(job_description).await;
        self.auto_save().await
    }

    /// Saves the current result if it came from a finished stream and has not
    /// been saved yet.
    pub async fn auto_save(&mut self) -> Option<SavedAnalysis> {
        if self.auto_saved || self.loaded_from_history {
            return None;
        }

        let session = self.controller.snapshot();
        if session.state != SessionState::Complete || session.result_source != ResultSource::Streaming {
            return None;
        }
        let result = session.result?;

        let job_description = self.draft.get().to_string();
        if job_description.trim().is_empty() {
            debug!("Draft is blank, not saving analysis");
            return None;
        }

        self.auto_saved = true;
        let saved = self.gateway.save(&job_description, result).await;
        info!(id = %saved.id, company = %saved.company_name, "Saved analysis");
        Some(saved)
    }

    /// Shows a saved analysis. Returns false if `id` is not in history.
    pub async fn open_saved(&mut self, id: &str) -> bool {
        let Some(entry) = self.gateway.get(id).await else {
            return false;
        };

        self.loaded_from_history = true;
        self.draft.set(entry.job_description);
        self.controller.load_result(entry.results);
        true
    }

    /// Cancels any analysis and clears the draft.
    pub fn start_over(&mut self) {
        self.controller.reset();
        self.draft.clear();
        self.loaded_from_history = false;
        self.auto_saved = false;
    }
}
