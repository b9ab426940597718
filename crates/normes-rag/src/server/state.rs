//! Application state for the RAG server

use serde::Serialize;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::pipeline::RagPipeline;
use crate::providers::Providers;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Answering pipeline
    pipeline: RagPipeline,
    /// Provider handles, kept for readiness probes
    providers: Providers,
}

/// Result of probing the upstream services
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Readiness {
    pub llm: bool,
    pub vector_db: bool,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.llm && self.vector_db
    }
}

impl AppState {
    /// Create new application state with the backends named in `config`
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!(
            "Initializing RAG application state (vector backend: {:?}, language: {:?})...",
            config.vector_db.backend,
            config.prompts.language
        );

        let providers = Providers::from_config(&config)?;
        let state = Self::from_providers(config, providers);

        let readiness = state.probe().await;
        if readiness.is_ready() {
            tracing::info!("Upstream services reachable");
        } else {
            tracing::warn!(
                llm = readiness.llm,
                vector_db = readiness.vector_db,
                "Some upstream services are not reachable yet"
            );
        }

        Ok(state)
    }

    /// Create state over existing provider handles
    pub fn from_providers(config: RagConfig, providers: Providers) -> Self {
        let pipeline = RagPipeline::from_providers(config, &providers);
        Self {
            inner: Arc::new(AppStateInner {
                pipeline,
                providers,
            }),
        }
    }

    /// Get the answering pipeline
    pub fn pipeline(&self) -> &RagPipeline {
        &self.inner.pipeline
    }

    /// Check the generation model server and the vector store
    pub async fn probe(&self) -> Readiness {
        let llm = self.inner.providers.llm.health_check().await.unwrap_or_else(|e| {
            tracing::warn!("LLM health check failed: {}", e);
            false
        });
        let vector_db = self.inner.providers.store.health_check().await.unwrap_or_else(|e| {
            tracing::warn!("Vector store health check failed: {}", e);
            false
        });

        Readiness { llm, vector_db }
    }
}
