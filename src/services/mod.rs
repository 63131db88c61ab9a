pub mod analysis;
pub mod interpreter;
pub mod loader;
pub mod memory_store;
pub mod oracle;
pub mod prompt;
pub mod renderer;

use anyhow::Result;
use uuid::Uuid;

use crate::models::dataset::StoredDataset;

// Define traits for service functionality

/// Storage for uploaded datasets. Raw bytes go in once at upload time and are
/// re-read (and re-parsed) on every question cycle.
#[async_trait::async_trait]
pub trait DatasetStore: Send + Sync + 'static {
    async fn put_dataset(&self, dataset: StoredDataset) -> Result<()>;
    async fn get_dataset(&self, id: Uuid) -> Result<Option<StoredDataset>>;
    fn list_ids(&self) -> Vec<Uuid>;
}

/// The generative-model oracle: opaque text in, best-effort text out.
#[async_trait::async_trait]
pub trait OracleService: Send + Sync + 'static {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[async_trait::async_trait]
impl DatasetStore for memory_store::MemoryDatasetStore {
    async fn put_dataset(&self, dataset: StoredDataset) -> Result<()> {
        self.put(dataset)
    }

    async fn get_dataset(&self, id: Uuid) -> Result<Option<StoredDataset>> {
        self.get(id)
    }

    fn list_ids(&self) -> Vec<Uuid> {
        self.ids()
    }
}

#[async_trait::async_trait]
impl OracleService for oracle::GeminiOracle {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_content(prompt).await
    }
}

// Re-export the services
pub use analysis::AnalysisService;
pub use memory_store::MemoryDatasetStore;
pub use oracle::GeminiOracle;
pub use renderer::ChartRenderer;
