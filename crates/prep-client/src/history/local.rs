//! Device-storage history.

use async_trait::async_trait;
use prep_models::SavedAnalysis;
use prep_persistence::{DeviceStore, PersistenceError};
use tracing::{debug, warn};

use super::HistoryStore;
use crate::error::Result;

/// Device key holding the saved list.
pub const SAVED_KEY: &str = "interview-prep-saved";

/// History kept as one JSON array in device storage.
///
/// Every mutation rewrites the whole array.
#[derive(Debug, Clone)]
pub struct LocalHistory {
    store: DeviceStore,
}

impl LocalHistory {
    pub fn new(store: DeviceStore) -> Self {
        Self { store }
    }

    /// Reads the stored array. Unparseable contents count as empty.
    fn read(&self) -> Result<Vec<SavedAnalysis>> {
        match self.store.get_json::<Vec<SavedAnalysis>>(SAVED_KEY) {
            Ok(items) => Ok(items.unwrap_or_default()),
            Err(PersistenceError::SerializeError(e)) => {
                warn!(error = %e, "Saved history is corrupt, treating as empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces the stored array with `items`.
    pub fn replace_all(&self, items: &[SavedAnalysis]) -> Result<()> {
        self.store.set_json(SAVED_KEY, &items)?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for LocalHistory {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn list(&self) -> Result<Vec<SavedAnalysis>> {
        self.read()
    }

    async fn create(&self, entry: SavedAnalysis) -> Result<SavedAnalysis> {
        let mut items = self.read()?;
        items.insert(0, entry.clone());
        self.replace_all(&items)?;
        debug!(id = %entry.id, count = items.len(), "Saved analysis locally");
        Ok(entry)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut items = self.read()?;
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            debug!(id, "No local entry to delete");
            return Ok(());
        }
        self.replace_all(&items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_models::AnalysisResult;
    use tempfile::tempdir;

    fn entry(company: &str) -> SavedAnalysis {
        SavedAnalysis::new(format!("Engineer at {}", company), AnalysisResult::new(company))
    }

    #[tokio::test]
    async fn test_empty_store_lists_nothing() {
        let dir = tempdir().unwrap();
        let history = LocalHistory::new(DeviceStore::new(dir.path()));
        assert!(history.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_prepends() {
        let dir = tempdir().unwrap();
        let history = LocalHistory::new(DeviceStore::new(dir.path()));

        let a = history.create(entry("Acme")).await.unwrap();
        let b = history.create(entry("Beta")).await.unwrap();

        let ids: Vec<String> = history.list().await.unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn test_create_keeps_local_id() {
        let dir = tempdir().unwrap();
        let history = LocalHistory::new(DeviceStore::new(dir.path()));

        let original = entry("Acme");
        let stored = history.create(original.clone()).await.unwrap();
        assert_eq!(stored, original);
    }

    #[tokio::test]
    async fn test_delete_filters_by_id() {
        let dir = tempdir().unwrap();
        let history = LocalHistory::new(DeviceStore::new(dir.path()));
        let a = history.create(entry("Acme")).await.unwrap();
        let b = history.create(entry("Beta")).await.unwrap();

        history.delete(&a.id).await.unwrap();
        history.delete("missing").await.unwrap();

        let items = history.list().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, b.id);
    }

    #[tokio::test]
    async fn test_replace_all_overwrites_stored_list() {
        let dir = tempdir().unwrap();
        let history = LocalHistory::new(DeviceStore::new(dir.path()));
        history.create(entry("Acme")).await.unwrap();

        let beta = entry("Beta");
        let gamma = entry("Gamma");
        history.replace_all(&[gamma.clone(), beta.clone()]).unwrap();

        assert_eq!(history.list().await.unwrap(), vec![gamma, beta]);
    }

    #[tokio::test]
    async fn test_stored_as_camel_case_array() {
        let dir = tempdir().unwrap();
        let store = DeviceStore::new(dir.path());
        let history = LocalHistory::new(store.clone());
        history.create(entry("Acme")).await.unwrap();

        let raw: serde_json::Value = store.get_json(SAVED_KEY).unwrap().unwrap();
        assert_eq!(raw[0]["companyName"], "Acme");
        assert_eq!(raw[0]["roleTitle"], "Acme Analysis");
        assert!(raw[0]["savedAt"].is_i64());
    }

    #[tokio::test]
    async fn test_corrupt_contents_read_as_empty() {
        let dir = tempdir().unwrap();
        let store = DeviceStore::new(dir.path());
        store.set(SAVED_KEY, "{not json").unwrap();

        let history = LocalHistory::new(store);
        assert!(history.list().await.unwrap().is_empty());

        // The next save replaces the corrupt value
        history.create(entry("Acme")).await.unwrap();
        assert_eq!(history.list().await.unwrap().len(), 1);
    }
}
