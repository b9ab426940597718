//! LLM provider trait for text generation

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::config::LlmConfig;
use crate::error::Result;

/// Incremental text fragments from a streaming generation
pub type TextStream = BoxStream<'static, Result<String>>;

/// Sampling and context options passed to every generation call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens to generate, the server default when `None`
    pub num_predict: Option<u32>,
    /// Context window in tokens
    pub num_ctx: u32,
}

impl GenerationOptions {
    /// Options for query answering
    pub fn for_query(config: &LlmConfig) -> Self {
        Self {
            temperature: config.temperature,
            num_predict: Some(config.num_predict),
            num_ctx: config.num_ctx,
        }
    }

    /// Options for document comparison (larger context window)
    pub fn for_comparison(config: &LlmConfig) -> Self {
        Self {
            num_ctx: config.comparison_num_ctx,
            ..Self::for_query(config)
        }
    }

    /// Deterministic options for the query classifier
    ///
    /// No token cap: reasoning models emit a `<think>` block before the tag.
    pub fn for_classifier(config: &LlmConfig) -> Self {
        Self {
            temperature: 0.0,
            num_predict: None,
            num_ctx: config.num_ctx,
        }
    }
}

/// Trait for text generation
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a complete response in one call
    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerationOptions,
    ) -> Result<String>;

    /// Start a streaming generation
    ///
    /// Dropping the returned stream releases the underlying connection.
    async fn generate_stream(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerationOptions,
    ) -> Result<TextStream>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &'static str;
}
