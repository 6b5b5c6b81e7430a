//! Qdrant implementation for passage retrieval
//!
//! Provides connection management, nearest-neighbour search over
//! document chunk embeddings, and collection management.

use crate::embedding::EmbeddingClient;
use aivo_core::{AivoError, CollectionStore, Passage, PassageSearch, Result, VectorConfig};
use async_trait::async_trait;
use qdrant_client::config::QdrantConfig;
use qdrant_client::qdrant::{DeleteCollectionBuilder, ScoredPoint, SearchPointsBuilder, Value};
use qdrant_client::Qdrant;
use std::collections::HashMap;

/// Qdrant vector store implementation
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
    text_field: String,
    embedder: Option<Box<dyn EmbeddingClient>>,
}

impl QdrantStore {
    /// Create a new Qdrant connection
    ///
    /// The returned store can manage collections; attach an embedder with
    /// [`QdrantStore::with_embedder`] before using it for search.
    pub fn new(config: &VectorConfig) -> Result<Self> {
        let client = client_config(config)
            .build()
            .map_err(|e| AivoError::VectorStore(format!("Qdrant connection failed: {e}")))?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
            text_field: config.text_field.clone(),
            embedder: None,
        })
    }

    /// Set the client used to embed queries
    pub fn with_embedder(mut self, embedder: Box<dyn EmbeddingClient>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

/// Client settings for `config`
///
/// The server version check is skipped: it runs at build time and writes
/// to stdout, which is the chat transcript.
fn client_config(config: &VectorConfig) -> QdrantConfig {
    Qdrant::from_url(&config.qdrant_url)
        .api_key(config.qdrant_api_key.clone())
        .skip_compatibility_check()
}

/// Pull the chunk text out of a point payload
fn payload_text(payload: &HashMap<String, Value>, field: &str) -> Option<String> {
    payload
        .get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
}

/// Passages in the order the store ranked them
///
/// Qdrant already orders hits best-first for the collection's metric, so
/// scores are not re-sorted here.
fn passages_from_points(points: Vec<ScoredPoint>, field: &str) -> Vec<Passage> {
    points
        .into_iter()
        .filter_map(|point| {
            let text = payload_text(&point.payload, field);
            if text.is_none() {
                tracing::debug!(field, "Skipping point without text payload");
            }
            text.map(|t| Passage::new(t, point.score))
        })
        .collect()
}

#[async_trait]
impl PassageSearch for QdrantStore {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Passage>> {
        let embedder = self.embedder.as_ref().ok_or_else(|| {
            AivoError::Config("Qdrant store has no embedding client attached".to_string())
        })?;

        tracing::info!(collection = %self.collection, top_k, "Retrieving context for query");
        let query_vector = embedder.embed(query).await?;

        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, query_vector, top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| AivoError::VectorStore(format!("Vector search failed: {e}")))?;

        let passages = passages_from_points(results.result, &self.text_field);
        tracing::debug!("Vector search returned {} passages", passages.len());

        Ok(passages)
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}

#[async_trait]
impl CollectionStore for QdrantStore {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let response =
            self.client.list_collections().await.map_err(|e| {
                AivoError::VectorStore(format!("Failed to list collections: {e}"))
            })?;

        Ok(response
            .collections
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.client
            .delete_collection(DeleteCollectionBuilder::new(name))
            .await
            .map_err(|e| AivoError::VectorStore(format!("Failed to delete collection: {e}")))?;

        Ok(())
    }
}
