//! Similarity search gated by a relevance threshold

use std::sync::Arc;

use crate::error::Result;
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::types::RetrievedPassage;

/// Separator placed between passages when they are joined into a context block
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Whether retrieved passages are relevant enough to ground an answer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevanceDecision {
    /// Context may be used
    pub usable: bool,
    /// Best score seen, if any passage came back
    pub top_score: Option<f32>,
    /// Threshold the decision was made against
    pub threshold: f32,
}

impl RelevanceDecision {
    /// Decide from a list of scores
    ///
    /// Empty results, or a best score under `threshold`, mean no usable context.
    pub fn from_scores(scores: &[f32], threshold: f32) -> Self {
        let top_score = scores.iter().copied().reduce(f32::max);
        Self {
            usable: top_score.is_some_and(|score| score >= threshold),
            top_score,
            threshold,
        }
    }
}

/// Passages returned for one query plus the gate's decision
#[derive(Debug, Clone)]
pub struct Retrieval {
    /// Ranked passages
    pub passages: Vec<RetrievedPassage>,
    /// Relevance decision over `passages`
    pub decision: RelevanceDecision,
}

impl Retrieval {
    /// Whether the passages may be used as context
    pub fn is_usable(&self) -> bool {
        self.decision.usable
    }

    /// Passage contents joined into one context block
    pub fn context(&self) -> String {
        self.passages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }

    /// Source identifiers in passage order
    pub fn source_ids(&self) -> Vec<Option<String>> {
        self.passages.iter().map(|p| p.source_id.clone()).collect()
    }

    /// Scores in passage order
    pub fn scores(&self) -> Vec<f32> {
        self.passages.iter().map(|p| p.score).collect()
    }
}

/// Embeds a query, searches the index and applies the relevance threshold
pub struct RetrievalGate {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    threshold: f32,
}

impl RetrievalGate {
    /// Create a gate over the given providers
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        threshold: f32,
    ) -> Self {
        Self {
            embedder,
            store,
            threshold,
        }
    }

    /// Retrieve up to `top_k` passages for `query` from `collection`
    pub async fn retrieve(&self, query: &str, collection: &str, top_k: usize) -> Result<Retrieval> {
        let embedding = self.embedder.embed(query).await?;
        let passages = self.store.search(collection, &embedding, top_k.max(1)).await?;

        let scores: Vec<f32> = passages.iter().map(|p| p.score).collect();
        let decision = RelevanceDecision::from_scores(&scores, self.threshold);

        tracing::info!(
            query,
            collection,
            ?scores,
            threshold = self.threshold,
            usable = decision.usable,
            "Retrieval completed"
        );

        Ok(Retrieval { passages, decision })
    }
}
