//! Saved analysis history.
//!
//! History lives on the backend when it is reachable and in device storage
//! otherwise. [`HistoryGateway`] hides the choice: the first operation checks
//! the backend once, and the outcome is kept for the rest of the session
//! unless a later remote call fails and forces a downgrade.
//!
//! # Backends
//!
//! - [`RemoteHistory`]: `GET/POST /api/history`, `DELETE /api/history/:id`
//! - [`LocalHistory`]: a JSON array under `interview-prep-saved` in the
//!   [`DeviceStore`](prep_persistence::DeviceStore)
//!
//! Both keep newest entries first.

mod gateway;
mod local;
mod remote;
mod resolver;

use std::fmt;

use async_trait::async_trait;
use prep_models::SavedAnalysis;

use crate::error::Result;

pub use gateway::HistoryGateway;
pub use local::{LocalHistory, SAVED_KEY};
pub use remote::RemoteHistory;
pub(crate) use resolver::StoreResolver;

/// Backing store for saved analyses.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Returns all entries, newest first.
    async fn list(&self) -> Result<Vec<SavedAnalysis>>;

    /// Stores `entry` and returns the record as the store kept it.
    ///
    /// Stores may assign their own id and timestamp.
    async fn create(&self, entry: SavedAnalysis) -> Result<SavedAnalysis>;

    /// Deletes the entry with `id`. Deleting an unknown id succeeds.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Which store the gateway is using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GatewayMode {
    /// No operation has run yet.
    #[default]
    Undetermined,
    Remote,
    Local,
}

impl fmt::Display for GatewayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayMode::Undetermined => write!(f, "undetermined"),
            GatewayMode::Remote => write!(f, "remote"),
            GatewayMode::Local => write!(f, "local"),
        }
    }
}
