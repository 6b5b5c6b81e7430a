//! Collection administration
//!
//! Lists and drops vector store collections. Dropping the markdown
//! collection also removes the ingestion ledger so the next ingest run
//! starts from scratch.

use aivo_core::{CollectionStore, Result, VectorConfig};
use std::path::PathBuf;
use std::sync::Arc;

/// Collection whose contents are recorded in the tracking file
pub const TRACKED_COLLECTION: &str = "markdown_collection";

/// Collection management front-end
pub struct CollectionAdmin {
    store: Arc<dyn CollectionStore>,
    tracking_file: PathBuf,
}

impl CollectionAdmin {
    pub fn new(store: Arc<dyn CollectionStore>, tracking_file: impl Into<PathBuf>) -> Self {
        Self {
            store,
            tracking_file: tracking_file.into(),
        }
    }

    /// Create from config
    pub fn from_config(store: Arc<dyn CollectionStore>, config: &VectorConfig) -> Self {
        Self::new(store, config.tracking_file.clone())
    }

    /// List all collections
    pub async fn list(&self) -> Result<Vec<String>> {
        let collections = self.store.list_collections().await?;

        tracing::info!("Found {} collections", collections.len());
        for name in &collections {
            tracing::info!(collection = %name, "- {name}");
        }

        Ok(collections)
    }

    /// Delete a collection by name
    ///
    /// Returns `false` when the collection does not exist or anything
    /// fails along the way; errors are logged, never returned.
    pub async fn delete(&self, name: &str) -> bool {
        match self.try_delete(name).await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::error!(collection = %name, kind = e.kind(), "Error deleting collection: {e}");
                false
            }
        }
    }

    async fn try_delete(&self, name: &str) -> Result<bool> {
        let collections = self.store.list_collections().await?;
        if !collections.iter().any(|c| c == name) {
            tracing::info!(collection = %name, "Collection does not exist");
            return Ok(false);
        }

        self.store.delete_collection(name).await?;
        tracing::info!(collection = %name, "Successfully deleted collection");

        if name == TRACKED_COLLECTION && tokio::fs::try_exists(&self.tracking_file).await? {
            tokio::fs::remove_file(&self.tracking_file).await?;
            tracing::info!(path = %self.tracking_file.display(), "Removed processed files tracking");
        }

        Ok(true)
    }
}
