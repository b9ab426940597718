//! Core types for the RAG pipeline

pub mod document;
pub mod query;
pub mod response;

pub use document::{FileType, RetrievedPassage, UploadedDocument};
pub use query::{ComparisonMode, ComparisonRequest, QueryRequest};
pub use response::{Answer, AnswerEvent, AnswerKind, ModelsResponse, QueryResponse, StreamRecord};
