//! History gateway with remote-first, local-fallback persistence.

use std::sync::Arc;

use prep_models::{AnalysisResult, SavedAnalysis};
use prep_persistence::DeviceStore;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{GatewayMode, HistoryStore, LocalHistory, RemoteHistory, StoreResolver};
use crate::config::ClientConfig;

struct GatewayState {
    resolver: StoreResolver,
    /// Cached list, newest first, matching the active store after every
    /// completed operation.
    items: Vec<SavedAnalysis>,
}

impl GatewayState {
    async fn ensure_resolved(&mut self) {
        if !self.resolver.is_resolved() {
            self.items = self.resolver.resolve().await;
        }
    }

    async fn downgrade(&mut self) {
        self.items = self.resolver.downgrade().await;
    }

    /// Writes the whole cached list to local storage.
    fn persist_local(&self) {
        if let Err(e) = self.resolver.local().replace_all(&self.items) {
            warn!(count = self.items.len(), error = %e, "Failed to write local history");
        }
    }
}

/// Saved analysis history for one session.
///
/// None of the operations fail: remote errors downgrade to local storage and
/// local write errors are logged, leaving the cached list updated. In local
/// mode every mutation rewrites storage from the cached list, so a write that
/// failed earlier is repaired by the next one that succeeds. The state lock is
/// held across store calls so mutations never interleave.
pub struct HistoryGateway {
    state: Mutex<GatewayState>,
}

impl HistoryGateway {
    pub fn new(remote: Arc<dyn HistoryStore>, local: LocalHistory) -> Self {
        Self {
            state: Mutex::new(GatewayState {
                resolver: StoreResolver::new(remote, local),
                items: Vec::new(),
            }),
        }
    }

    /// Builds a gateway over the configured backend and `store`.
    pub fn from_config(config: &ClientConfig, store: DeviceStore) -> Self {
        Self::new(
            Arc::new(RemoteHistory::new(config.clone())),
            LocalHistory::new(store),
        )
    }

    /// Returns the store in use, `Undetermined` before the first operation.
    pub async fn mode(&self) -> GatewayMode {
        self.state.lock().await.resolver.mode()
    }

    /// Returns all saved analyses, newest first.
    ///
    /// The first call picks the store; later calls return the cached list.
    pub async fn list(&self) -> Vec<SavedAnalysis> {
        let mut state = self.state.lock().await;
        state.ensure_resolved().await;
        state.items.clone()
    }

    /// Looks up one cached entry.
    pub async fn get(&self, id: &str) -> Option<SavedAnalysis> {
        let mut state = self.state.lock().await;
        state.ensure_resolved().await;
        state.items.iter().find(|item| item.id == id).cloned()
    }

    /// Saves a completed analysis and returns the stored record.
    pub async fn save(&self, job_description: &str, result: AnalysisResult) -> SavedAnalysis {
        let entry = SavedAnalysis::new(job_description, result);

        let mut state = self.state.lock().await;
        state.ensure_resolved().await;

        if state.resolver.mode() == GatewayMode::Remote {
            let remote = Arc::clone(state.resolver.remote());
            match remote.create(entry.clone()).await {
                Ok(saved) => {
                    state.items.insert(0, saved.clone());
                    return saved;
                }
                Err(e) => {
                    warn!(error = %e, "Remote save failed, falling back to local history");
                    state.downgrade().await;
                }
            }
        }

        state.items.insert(0, entry.clone());
        state.persist_local();
        debug!(id = %entry.id, count = state.items.len(), "Saved analysis locally");
        entry
    }

    /// Removes the entry with `id`. Unknown ids are ignored.
    pub async fn remove(&self, id: &str) {
        let mut state = self.state.lock().await;
        state.ensure_resolved().await;

        if state.resolver.mode() == GatewayMode::Remote {
            let remote = Arc::clone(state.resolver.remote());
            match remote.delete(id).await {
                Ok(()) => {
                    state.items.retain(|item| item.id != id);
                    return;
                }
                Err(e) => {
                    warn!(id, error = %e, "Remote delete failed, falling back to local history");
                    state.downgrade().await;
                }
            }
        }

        let before = state.items.len();
        state.items.retain(|item| item.id != id);
        if state.items.len() == before {
            debug!(id, "No local entry to delete");
            return;
        }
        state.persist_local();
    }

    /// Checks the backend again and reloads the list from the chosen store.
    pub async fn refresh(&self) -> Vec<SavedAnalysis> {
        let mut state = self.state.lock().await;
        state.items = state.resolver.resolve().await;
        debug!(mode = %state.resolver.mode(), count = state.items.len(), "Refreshed history");
        state.items.clone()
    }
}
