//! Query and comparison request types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Query request for RAG answering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The user's question
    pub query: String,

    /// Generation model override (falls back to the configured default)
    #[serde(default)]
    pub model: Option<String>,

    /// Index collection to search (falls back to the configured default)
    #[serde(default)]
    pub collection_name: Option<String>,
}

impl QueryRequest {
    /// Create a new query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            model: None,
            collection_name: None,
        }
    }

    /// Set the generation model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Supported comparison modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonMode {
    /// Technical specifications, requirements and implementation details
    Technical,
    /// Regulatory requirements, safety and compliance obligations
    Compliance,
    /// Key differences between the documents
    Differences,
    /// Common ground between the documents
    Similarities,
}

impl ComparisonMode {
    /// Every supported mode, in display order
    pub const ALL: [ComparisonMode; 4] = [
        ComparisonMode::Technical,
        ComparisonMode::Compliance,
        ComparisonMode::Differences,
        ComparisonMode::Similarities,
    ];

    /// Wire name of the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Compliance => "compliance",
            Self::Differences => "differences",
            Self::Similarities => "similarities",
        }
    }

    fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonMode {
    type Err = Error;

    /// Exact, case-sensitive match against the supported set
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| Error::UnsupportedComparisonMode {
                mode: s.to_string(),
                supported: Self::supported_list(),
            })
    }
}

/// Request to compare two documents
///
/// `mode` stays a raw string until the pipeline validates it, so that an
/// unsupported mode is reported as a rejected request rather than a
/// deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRequest {
    /// Raw text of the first document
    pub file1_content: String,
    /// Display name of the first document
    pub file1_name: String,
    /// Raw text of the second document
    pub file2_content: String,
    /// Display name of the second document
    pub file2_name: String,
    /// Comparison mode
    pub mode: String,

    /// Generation model override
    #[serde(default)]
    pub model: Option<String>,

    /// Index collection to search for shared context
    #[serde(default)]
    pub collection_name: Option<String>,
}

impl ComparisonRequest {
    /// Create a comparison request
    pub fn new(
        file1_name: impl Into<String>,
        file1_content: impl Into<String>,
        file2_name: impl Into<String>,
        file2_content: impl Into<String>,
        mode: impl Into<String>,
    ) -> Self {
        Self {
            file1_content: file1_content.into(),
            file1_name: file1_name.into(),
            file2_content: file2_content.into(),
            file2_name: file2_name.into(),
            mode: mode.into(),
            model: None,
            collection_name: None,
        }
    }
}
