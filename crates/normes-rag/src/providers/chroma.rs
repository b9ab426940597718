//! Chroma vector search provider
//!
//! Queries a prebuilt Chroma collection over its REST API. Collections are
//! resolved by name once and cached for the lifetime of the store.

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::providers::vector_store::VectorStoreProvider;
use crate::types::RetrievedPassage;

/// Distance function a collection was built with (`hnsw:space` metadata)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceSpace {
    /// Squared euclidean distance (Chroma default)
    L2,
    /// Cosine distance
    Cosine,
    /// Inner product
    InnerProduct,
}

impl DistanceSpace {
    fn from_metadata(metadata: Option<&HashMap<String, Value>>) -> Self {
        match metadata
            .and_then(|m| m.get("hnsw:space"))
            .and_then(Value::as_str)
        {
            Some("cosine") => Self::Cosine,
            Some("ip") => Self::InnerProduct,
            _ => Self::L2,
        }
    }

    /// Convert a raw distance into a relevance score where higher is better
    ///
    /// Matches the normalisation the ingestion side used when the threshold
    /// was tuned, so the same cutoff applies regardless of backend.
    pub fn relevance(&self, distance: f32) -> f32 {
        match self {
            Self::L2 => 1.0 - distance / std::f32::consts::SQRT_2,
            Self::Cosine => 1.0 - distance,
            Self::InnerProduct => {
                if distance > 0.0 {
                    1.0 - distance
                } else {
                    -distance
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
struct CollectionInfo {
    id: String,
    space: DistanceSpace,
}

#[derive(serde::Deserialize)]
struct CollectionResponse {
    id: String,
    #[serde(default)]
    metadata: Option<HashMap<String, Value>>,
}

#[derive(serde::Serialize)]
struct QueryRequest<'a> {
    query_embeddings: [&'a [f32]; 1],
    n_results: usize,
    include: [&'static str; 3],
}

#[derive(serde::Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<HashMap<String, Value>>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f32>>>,
}

/// Chroma REST provider
pub struct ChromaStore {
    client: Client,
    base_url: String,
    collections: RwLock<HashMap<String, CollectionInfo>>,
}

impl ChromaStore {
    /// Create a new Chroma provider
    pub fn new(config: &VectorDbConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.chroma_url.trim_end_matches('/').to_string(),
            collections: RwLock::new(HashMap::new()),
        })
    }

    /// Resolve a collection name, fetching it from the server on first use
    async fn collection(&self, name: &str) -> Result<CollectionInfo> {
        if let Some(info) = self.collections.read().get(name) {
            return Ok(info.clone());
        }

        let url = format!("{}/api/v1/collections/{}", self.base_url, name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("Chroma collection lookup failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::vector_db(format!(
                "Chroma collection '{}' unavailable ({}): {}",
                name, status, body
            )));
        }

        let collection: CollectionResponse = response
            .json()
            .await
            .map_err(|e| Error::vector_db(format!("Failed to parse Chroma collection: {}", e)))?;

        let info = CollectionInfo {
            id: collection.id,
            space: DistanceSpace::from_metadata(collection.metadata.as_ref()),
        };

        tracing::info!(
            "Resolved Chroma collection '{}' ({}, {:?})",
            name,
            info.id,
            info.space
        );

        self.collections
            .write()
            .insert(name.to_string(), info.clone());

        Ok(info)
    }
}

/// Turn the first (and only) query row of a Chroma response into passages
fn passages_from_response(response: QueryResponse, space: DistanceSpace) -> Vec<RetrievedPassage> {
    let documents = response
        .documents
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default();
    let mut metadatas = response
        .metadatas
        .and_then(|m| m.into_iter().next())
        .unwrap_or_default()
        .into_iter();
    let mut distances = response
        .distances
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default()
        .into_iter();

    let mut passages: Vec<RetrievedPassage> = documents
        .into_iter()
        .map(|document| {
            let metadata = metadatas.next().flatten();
            let distance = distances.next().unwrap_or(f32::INFINITY);
            let source_id = metadata
                .as_ref()
                .and_then(|m| m.get("id"))
                .and_then(Value::as_str)
                .map(str::to_string);
            RetrievedPassage::new(
                document.unwrap_or_default(),
                space.relevance(distance),
                source_id,
            )
        })
        .collect();

    passages.sort_by(|a, b| b.score.total_cmp(&a.score));
    passages
}

#[async_trait]
impl VectorStoreProvider for ChromaStore {
    async fn search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        let info = self.collection(collection).await?;

        let request = QueryRequest {
            query_embeddings: [query_embedding],
            n_results: top_k,
            include: ["documents", "metadatas", "distances"],
        };

        let url = format!("{}/api/v1/collections/{}/query", self.base_url, info.id);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("Chroma search failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::vector_db(format!(
                "Chroma search failed ({}): {}",
                status, body
            )));
        }

        let query_response: QueryResponse = response
            .json()
            .await
            .map_err(|e| Error::vector_db(format!("Failed to parse Chroma results: {}", e)))?;

        Ok(passages_from_response(query_response, info.space))
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/v1/heartbeat", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &'static str {
        "chroma"
    }
}
