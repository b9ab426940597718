//! Uploaded document and passage types with source tracking for citations

use serde::{Deserialize, Serialize};

/// File types accepted for upload
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a filename
    pub fn from_filename(filename: &str) -> Self {
        match filename.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }

    /// Whether text can be extracted from this type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// A passage returned by similarity search
///
/// Lives for the duration of one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Passage text
    pub content: String,
    /// Relevance score (higher is more relevant)
    pub score: f32,
    /// Opaque source identifier such as `path/file.pdf:12:3`
    pub source_id: Option<String>,
}

impl RetrievedPassage {
    /// Create a passage
    pub fn new(content: impl Into<String>, score: f32, source_id: Option<String>) -> Self {
        Self {
            content: content.into(),
            score,
            source_id,
        }
    }
}

/// Caller-supplied document, already read into memory
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Original filename (used to pick the text extractor)
    pub filename: String,
    /// Raw file bytes
    pub data: Vec<u8>,
}

impl UploadedDocument {
    /// Create an uploaded document
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }
}
