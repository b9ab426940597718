//! API routes for the RAG server

pub mod query;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use crate::server::state::AppState;

/// Build the `/api/rag` routes
pub fn rag_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/chat", post(query::chat))
        .route("/chat/stream", post(query::chat_stream))
        .route("/compare", post(query::compare))
        .route("/compare/stream", post(query::compare_stream))
        // Uploads get a larger body limit
        .route(
            "/chat/file",
            post(query::chat_file).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/models", get(query::list_models))
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "normes-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Question answering and document comparison over electrical standards",
        "endpoints": {
            "POST /api/rag/chat": "Answer a question with sources",
            "POST /api/rag/chat/stream": "Answer a question as NDJSON records",
            "POST /api/rag/compare": "Compare two documents (technical, compliance, differences, similarities)",
            "POST /api/rag/compare/stream": "Compare two documents as NDJSON records",
            "POST /api/rag/chat/file": "Answer a question about an uploaded PDF, text or Markdown file",
            "GET /api/rag/models": "List available generation models"
        }
    }))
}
