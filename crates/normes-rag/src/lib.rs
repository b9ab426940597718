//! normes-rag: Retrieval-augmented answers over a corpus of electrical standards
//!
//! A query is first admitted by a small classifier model, then answered from
//! passages retrieved by similarity search, but only when the best passage
//! clears a relevance threshold. Otherwise a fixed answer listing the covered
//! standards is returned. Two documents can also be compared under one of
//! four modes, and a question can be asked about an uploaded file. Answers
//! end with a Markdown block citing source files and pages, and can be
//! streamed as incremental events.

pub mod classification;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use generation::AnswerStream;
pub use pipeline::RagPipeline;
pub use types::{
    Answer, AnswerEvent, AnswerKind, ComparisonMode, ComparisonRequest, QueryRequest,
    UploadedDocument,
};
