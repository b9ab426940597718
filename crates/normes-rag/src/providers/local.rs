//! Local vector store loaded from a JSON snapshot
//!
//! Brute-force cosine search over an exported index. Useful for tests and
//! for running without a Chroma server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::RetrievedPassage;

use super::vector_store::VectorStoreProvider;

/// One indexed passage in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPassage {
    /// Source identifier (`path:page:chunk`)
    #[serde(default)]
    pub id: Option<String>,
    /// Passage text
    pub content: String,
    /// Precomputed embedding
    pub embedding: Vec<f32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    collections: HashMap<String, Vec<StoredPassage>>,
}

/// In-memory, read-only vector store
pub struct LocalVectorStore {
    collections: HashMap<String, Vec<StoredPassage>>,
}

impl LocalVectorStore {
    /// Load a snapshot file of the form `{"collections": {"name": [passages]}}`
    pub fn from_snapshot(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::vector_db(format!("Failed to read snapshot '{}': {}", path.display(), e))
        })?;
        let snapshot: Snapshot = serde_json::from_str(&raw).map_err(|e| {
            Error::vector_db(format!("Invalid snapshot '{}': {}", path.display(), e))
        })?;

        tracing::info!(
            "Loaded vector snapshot {} ({} collections)",
            path.display(),
            snapshot.collections.len()
        );

        Ok(Self {
            collections: snapshot.collections,
        })
    }

    /// Build a store holding a single collection
    pub fn from_passages(collection: impl Into<String>, passages: Vec<StoredPassage>) -> Self {
        let mut collections = HashMap::new();
        collections.insert(collection.into(), passages);
        Self { collections }
    }
}

/// Cosine similarity between two vectors of equal length
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

#[async_trait]
impl VectorStoreProvider for LocalVectorStore {
    async fn search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        let passages = self
            .collections
            .get(collection)
            .ok_or_else(|| Error::vector_db(format!("Unknown collection '{}'", collection)))?;

        let mut results: Vec<RetrievedPassage> = passages
            .iter()
            .map(|p| {
                RetrievedPassage::new(
                    p.content.clone(),
                    cosine_similarity(query_embedding, &p.embedding),
                    p.id.clone(),
                )
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);
        Ok(results)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
