//! Response types for RAG queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How an answer was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    /// Composed by the generation model
    Generated,
    /// Guidance text from the query classifier
    Guidance,
    /// Fixed fallback because the index had no relevant material
    NoContext,
}

/// A finalized, non-streaming answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text, including the formatted sources block when any
    pub text: String,
    /// How the answer was produced
    pub kind: AnswerKind,
    /// Generation model used, when one was called
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Answer {
    /// Answer composed by the generation model
    pub fn generated(text: String, model: impl Into<String>) -> Self {
        Self {
            text,
            kind: AnswerKind::Generated,
            model: Some(model.into()),
        }
    }

    /// Classifier guidance returned instead of an answer
    pub fn guidance(text: String) -> Self {
        Self {
            text,
            kind: AnswerKind::Guidance,
            model: None,
        }
    }

    /// Fixed fallback for queries without usable context
    pub fn no_context(text: String) -> Self {
        Self {
            text,
            kind: AnswerKind::NoContext,
            model: None,
        }
    }
}

/// One unit of a streamed answer
///
/// A stream carries any number of `Content` events followed by exactly one
/// terminal event: `Sources` on success or `Error` on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerEvent {
    /// Text fragment
    Content(String),
    /// Formatted citation block (possibly empty), terminal
    Sources(String),
    /// Failure message, terminal
    Error(String),
}

impl AnswerEvent {
    /// Whether this event ends the stream
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AnswerEvent::Content(_))
    }
}

/// Independently-parseable streaming record (one NDJSON line)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamRecord {
    /// Model answering the request
    pub model: String,
    /// Emission timestamp
    pub created_at: DateTime<Utc>,
    /// Text fragment; empty on the final record, absent on error records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Formatted citation block, only on the final record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<String>,
    /// Failure message, only on error records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether this is the last record
    pub done: bool,
}

impl StreamRecord {
    /// Build the wire record for an event
    pub fn from_event(event: AnswerEvent, model: &str) -> Self {
        let created_at = Utc::now();
        let model = model.to_string();
        match event {
            AnswerEvent::Content(content) => Self {
                model,
                created_at,
                content: Some(content),
                sources: None,
                error: None,
                done: false,
            },
            AnswerEvent::Sources(sources) => Self {
                model,
                created_at,
                content: Some(String::new()),
                sources: Some(sources),
                error: None,
                done: true,
            },
            AnswerEvent::Error(error) => Self {
                model,
                created_at,
                content: None,
                sources: None,
                error: Some(error),
                done: true,
            },
        }
    }
}

/// Non-streaming HTTP response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Answer text
    pub response: String,
    /// How the answer was produced
    pub kind: AnswerKind,
    /// Generation model used, when one was called
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl QueryResponse {
    /// Wrap a finalized answer
    pub fn new(answer: Answer, processing_time_ms: u64) -> Self {
        Self {
            response: answer.text,
            kind: answer.kind,
            model: answer.model,
            processing_time_ms,
        }
    }
}

/// Models offered to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    /// Model identifiers
    pub models: Vec<String>,
}
