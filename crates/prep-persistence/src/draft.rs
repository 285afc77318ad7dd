//! Persistent draft of the job description being edited.

use tracing::{debug, warn};

use crate::kv::DeviceStore;

/// Device key holding the draft text.
pub const DRAFT_KEY: &str = "interview-prep-input";

/// Keeps the user's not-yet-submitted input in sync with device storage.
///
/// The value is loaded once and written through on every change. Storage is
/// best-effort: a failed read yields an empty draft and a failed write is
/// logged and otherwise ignored, the in-memory value always wins.
#[derive(Debug)]
pub struct DraftStore {
    store: DeviceStore,
    value: String,
}

impl DraftStore {
    /// Loads the draft from `store`.
    pub fn load(store: DeviceStore) -> Self {
        let value = match store.get(DRAFT_KEY) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Failed to read saved draft, starting empty");
                String::new()
            }
        };
        debug!(chars = value.chars().count(), "Loaded draft");
        Self { store, value }
    }

    /// Returns the current draft.
    pub fn get(&self) -> &str {
        &self.value
    }

    /// Replaces the draft and persists it.
    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        if let Err(e) = self.store.set(DRAFT_KEY, &self.value) {
            warn!(error = %e, "Failed to persist draft");
        }
    }

    /// Empties the draft.
    pub fn clear(&mut self) {
        self.set(String::new());
    }
}
