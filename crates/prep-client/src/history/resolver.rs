//! Remote-or-local store selection.

use std::sync::Arc;

use prep_models::SavedAnalysis;
use tracing::{info, warn};

use super::{GatewayMode, HistoryStore, LocalHistory};

/// Picks between the remote and local history and remembers the choice.
pub(crate) struct StoreResolver {
    remote: Arc<dyn HistoryStore>,
    local: LocalHistory,
    mode: GatewayMode,
}

impl StoreResolver {
    pub fn new(remote: Arc<dyn HistoryStore>, local: LocalHistory) -> Self {
        Self {
            remote,
            local,
            mode: GatewayMode::Undetermined,
        }
    }

    pub fn mode(&self) -> GatewayMode {
        self.mode
    }

    pub fn is_resolved(&self) -> bool {
        self.mode != GatewayMode::Undetermined
    }

    pub fn remote(&self) -> &Arc<dyn HistoryStore> {
        &self.remote
    }

    pub fn local(&self) -> &LocalHistory {
        &self.local
    }

    /// Lists the remote store and settles on it if that succeeds, otherwise
    /// switches to local. Returns the list of whichever store was chosen.
    pub async fn resolve(&mut self) -> Vec<SavedAnalysis> {
        match self.remote.list().await {
            Ok(items) => {
                if self.mode != GatewayMode::Remote {
                    info!(store = self.remote.name(), count = items.len(), "Using remote history");
                }
                self.mode = GatewayMode::Remote;
                items
            }
            Err(e) => {
                warn!(error = %e, "Remote history unavailable");
                self.downgrade().await
            }
        }
    }

    /// Switches to local storage and returns its current list.
    ///
    /// A local read failure yields an empty list.
    pub async fn downgrade(&mut self) -> Vec<SavedAnalysis> {
        if self.mode != GatewayMode::Local {
            info!(store = self.local.name(), "Using local history");
        }
        self.mode = GatewayMode::Local;

        match self.local.list().await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Failed to read local history");
                Vec::new()
            }
        }
    }
}
