//! Vector store provider trait for similarity search

use async_trait::async_trait;

use crate::error::Result;
use crate::types::RetrievedPassage;

/// Trait for read-only similarity search over a prebuilt index
///
/// Implementations:
/// - `ChromaStore`: Remote Chroma server
/// - `LocalVectorStore`: In-memory snapshot
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Return up to `top_k` passages ranked by descending relevance score
    async fn search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &'static str;
}
