use anyhow::{anyhow, Result};
use log::info;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::models::dataset::StoredDataset;

/// In-memory dataset store. Uploaded bytes are write-once and read-only for
/// the lifetime of the process; nothing is persisted to disk.
#[derive(Clone, Debug)]
pub struct MemoryDatasetStore {
    data: Arc<Mutex<HashMap<Uuid, StoredDataset>>>,
}

impl MemoryDatasetStore {
    pub fn new() -> Self {
        info!("🗄️ In-memory dataset store initialized");
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn put(&self, dataset: StoredDataset) -> Result<()> {
        info!(
            "📤 Storing dataset {} ({}, {} bytes)",
            dataset.id,
            dataset.filename,
            dataset.bytes.len()
        );
        let mut data = self
            .data
            .lock()
            .map_err(|_| anyhow!("Failed to lock dataset store"))?;
        data.insert(dataset.id, dataset);
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Result<Option<StoredDataset>> {
        let data = self
            .data
            .lock()
            .map_err(|_| anyhow!("Failed to lock dataset store"))?;
        Ok(data.get(&id).cloned())
    }

    pub fn ids(&self) -> Vec<Uuid> {
        match self.data.lock() {
            Ok(data) => data.keys().copied().collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Default for MemoryDatasetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dataset::DatasetFormat;
    use chrono::Utc;

    fn sample_dataset(id: Uuid) -> StoredDataset {
        StoredDataset {
            id,
            filename: "people.csv".to_string(),
            format: DatasetFormat::Csv,
            bytes: b"name,age\nAda,36\n".to_vec(),
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn stores_and_retrieves_by_id() {
        let store = MemoryDatasetStore::new();
        let id = Uuid::new_v4();
        store.put(sample_dataset(id)).unwrap();

        let found = store.get(id).unwrap().unwrap();
        assert_eq!(found.filename, "people.csv");
        assert!(store.get(Uuid::new_v4()).unwrap().is_none());
        assert_eq!(store.ids(), vec![id]);
    }
}
