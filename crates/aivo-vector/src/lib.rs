//! AIVO Vector - Vector database access
//!
//! Provides passage retrieval over Qdrant, query embedding clients,
//! and collection administration.

pub mod admin;
pub mod embedding;
pub mod qdrant_store;

pub use admin::{CollectionAdmin, TRACKED_COLLECTION};
pub use embedding::{
    create_embedding_client, EmbeddingClient, HuggingFaceEmbedding, OllamaEmbedding,
};
pub use qdrant_store::QdrantStore;
