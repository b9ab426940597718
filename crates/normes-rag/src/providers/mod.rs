//! Provider abstractions for embeddings, generation and similarity search
//!
//! The pipeline only talks to these traits; concrete backends are picked at
//! startup and shared for the lifetime of the process.

use std::sync::Arc;

use crate::config::{RagConfig, VectorBackend};
use crate::error::{Error, Result};

pub mod chroma;
pub mod embedding;
pub mod llm;
pub mod local;
pub mod ollama;
pub mod vector_store;

pub use chroma::ChromaStore;
pub use embedding::EmbeddingProvider;
pub use llm::{GenerationOptions, LlmProvider, TextStream};
pub use local::LocalVectorStore;
pub use ollama::{OllamaEmbedder, OllamaLlm, OllamaProvider};
pub use vector_store::VectorStoreProvider;

/// Long-lived provider handles shared by every request
#[derive(Clone)]
pub struct Providers {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub store: Arc<dyn VectorStoreProvider>,
    pub llm: Arc<dyn LlmProvider>,
}

impl Providers {
    /// Build the backends selected in `config`
    ///
    /// Embeddings and generation share one Ollama client.
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let (embedder, llm) = OllamaProvider::new(&config.llm)?.split();
        tracing::info!(
            "Ollama at {} (embeddings: {}, generation: {}, classifier: {})",
            config.llm.base_url,
            config.llm.embed_model,
            config.llm.generate_model,
            config.llm.formulator_model
        );

        let store: Arc<dyn VectorStoreProvider> = match config.vector_db.backend {
            VectorBackend::Chroma => {
                tracing::info!("Using Chroma vector store at {}", config.vector_db.chroma_url);
                Arc::new(ChromaStore::new(&config.vector_db)?)
            }
            VectorBackend::Local => {
                let path = config.vector_db.snapshot_path.as_deref().ok_or_else(|| {
                    Error::Config("local vector backend requires vector_db.snapshot_path".to_string())
                })?;
                tracing::info!("Using local vector snapshot {}", path.display());
                Arc::new(LocalVectorStore::from_snapshot(path)?)
            }
        };

        Ok(Self {
            embedder: Arc::new(embedder),
            store,
            llm: Arc::new(llm),
        })
    }
}
