//! Configuration for the RAG pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Main RAG configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RagConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Ollama/LLM configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Retrieval gate configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Query classifier configuration
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// Prompt assembly configuration
    #[serde(default)]
    pub prompts: PromptConfig,
    /// Vector database configuration
    #[serde(default)]
    pub vector_db: VectorDbConfig,
}

impl RagConfig {
    /// Load configuration from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("Invalid config file '{}': {}", path.display(), e)))
    }

    /// Apply overrides using the variable names of the deployed environment
    ///
    /// `lookup` returns the raw value of a variable if it is set.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, "RETRIEVING_THRESHOLD")? {
            self.retrieval.relevance_threshold = v;
        }
        if let Some(v) = parse_var(&lookup, "TOP_K")? {
            self.retrieval.top_k = v;
            // Comparison retrieval follows TOP_K unless set explicitly
            self.retrieval.comparison_top_k = v;
        }
        if let Some(v) = parse_var(&lookup, "COMPARISON_TOP_K")? {
            self.retrieval.comparison_top_k = v;
        }
        if let Some(v) = lookup("COLLECTION_NAME") {
            self.retrieval.default_collection = v;
        }
        if let Some(v) = lookup("CHAT_MODEL") {
            self.llm.generate_model = v;
        }
        if let Some(v) = parse_var(&lookup, "CHAT_MODEL_TEMPERATURE")? {
            self.llm.temperature = v;
        }
        if let Some(v) = lookup("OLLAMA_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = lookup("OLLAMA_EMBED_MODEL") {
            self.llm.embed_model = v;
        }
        if let Some(v) = lookup("FORMULATOR_MODEL") {
            self.llm.formulator_model = v;
        }
        if let Some(v) = lookup("CHROMA_URL") {
            self.vector_db.chroma_url = v;
        }
        if let Some(v) = lookup("VECTOR_SNAPSHOT_PATH") {
            self.vector_db.snapshot_path = Some(PathBuf::from(v));
        }
        if let Some(v) = parse_var(&lookup, "VECTOR_BACKEND")? {
            self.vector_db.backend = v;
        }
        if let Some(v) = parse_var(&lookup, "RAG_LANGUAGE")? {
            self.prompts.language = v;
        }
        Ok(())
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.retrieval.relevance_threshold.is_finite() {
            return Err(Error::Config("relevance_threshold must be a finite number".to_string()));
        }
        if self.retrieval.top_k == 0 || self.retrieval.comparison_top_k == 0 {
            return Err(Error::Config("top_k and comparison_top_k must be at least 1".to_string()));
        }
        if self.prompts.max_document_chars == 0 {
            return Err(Error::Config("max_document_chars must be at least 1".to_string()));
        }
        if self.prompts.upload_chunk_overlap >= self.prompts.upload_chunk_size {
            return Err(Error::Config(
                "upload_chunk_overlap must be smaller than upload_chunk_size".to_string(),
            ));
        }
        if self.vector_db.backend == VectorBackend::Local
            && self.vector_db.snapshot_path.is_none()
        {
            return Err(Error::Config(
                "local vector backend requires vector_db.snapshot_path".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("Invalid value for {}: '{}' ({})", name, raw, e))),
        None => Ok(None),
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Default generation model name
    pub generate_model: String,
    /// Small model used by the query classifier
    pub formulator_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Bound in seconds on one-shot requests and on each wait between
    /// streamed chunks
    pub timeout_secs: u64,
    /// Number of retries for failed one-shot requests
    pub max_retries: u32,
    /// Maximum tokens to generate
    pub num_predict: u32,
    /// Context window for query answering (tokens)
    pub num_ctx: u32,
    /// Context window for document comparison (tokens)
    pub comparison_num_ctx: u32,
    /// Models offered to callers
    pub available_models: Vec<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            generate_model: "mistral-small3.1:latest".to_string(),
            formulator_model: "mistral:7b".to_string(),
            temperature: 0.3,
            timeout_secs: 300,
            max_retries: 2,
            num_predict: 8192,
            num_ctx: 10500,
            comparison_num_ctx: 16384,
            available_models: [
                "qwen3:30b-a3b",
                "qwen3:32b",
                "qwq:32b",
                "mistral-small:latest",
                "mistral-small3.1:latest",
                "deepseek-r1:32b",
                "deepseek-r1:14b",
                "llama3.1:latest",
            ]
            .iter()
            .map(|m| m.to_string())
            .collect(),
        }
    }
}

/// Retrieval gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Minimum relevance score of the best passage for context to be usable
    pub relevance_threshold: f32,
    /// Passages retrieved per query
    pub top_k: usize,
    /// Passages retrieved as shared context for comparisons
    pub comparison_top_k: usize,
    /// Collection used when the caller does not name one
    pub default_collection: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: 0.6,
            top_k: 5,
            comparison_top_k: 5,
            default_collection: "normes".to_string(),
        }
    }
}

/// Query classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Queries shorter than this (after trimming) are rejected as too short
    pub min_query_chars: usize,
    /// Bounded wait for the auxiliary model
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_query_chars: 3,
            timeout_secs: 30,
        }
    }
}

/// Prompt assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Language of templates and fixed answers
    pub language: PromptLanguage,
    /// Character budget per compared document (about 4 chars per token)
    pub max_document_chars: usize,
    /// Chunk size for uploaded documents
    pub upload_chunk_size: usize,
    /// Chunk overlap for uploaded documents
    pub upload_chunk_overlap: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            language: PromptLanguage::Fr,
            max_document_chars: 10_000 * 4,
            upload_chunk_size: 1000,
            upload_chunk_overlap: 200,
        }
    }
}

/// Template language
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PromptLanguage {
    /// French (default)
    #[default]
    Fr,
    /// English
    En,
}

impl FromStr for PromptLanguage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fr" | "french" => Ok(Self::Fr),
            "en" | "english" => Ok(Self::En),
            other => Err(format!("unknown language '{}'", other)),
        }
    }
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Which index backend to query
    pub backend: VectorBackend,
    /// Chroma server URL
    pub chroma_url: String,
    /// JSON snapshot for the local backend
    pub snapshot_path: Option<PathBuf>,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Chroma,
            chroma_url: "http://localhost:8000".to_string(),
            snapshot_path: None,
        }
    }
}

/// Vector index backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    /// Remote Chroma server
    #[default]
    Chroma,
    /// In-memory index loaded from a JSON snapshot
    Local,
}

impl FromStr for VectorBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chroma" => Ok(Self::Chroma),
            "local" => Ok(Self::Local),
            other => Err(format!("unknown vector backend '{}'", other)),
        }
    }
}
