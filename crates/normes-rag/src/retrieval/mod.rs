//! Relevance-gated retrieval from the semantic index

mod gate;

pub use gate::{RelevanceDecision, Retrieval, RetrievalGate, CONTEXT_SEPARATOR};
