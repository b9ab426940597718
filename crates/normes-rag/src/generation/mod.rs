//! Prompt assembly, answer generation and source formatting

pub mod citation;
pub mod ollama;
pub mod prompt;
pub mod responder;
pub mod templates;

pub use citation::{format_sources_as_markdown, format_upload_sources, SOURCES_HEADING};
pub use ollama::OllamaClient;
pub use prompt::{DocumentInput, PromptBuilder};
pub use responder::{error_stream, immediate_stream, AnswerStream, ResponseGenerator};
