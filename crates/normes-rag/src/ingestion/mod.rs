//! Uploaded document handling: text extraction, normalization and chunking

mod chunker;
mod normalizer;
mod parser;

pub use chunker::TextChunker;
pub use normalizer::DocumentNormalizer;
pub use parser::{FileParser, ParsedDocument};
