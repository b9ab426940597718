//! Chat, comparison and uploaded-document endpoints

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use futures::{Stream, StreamExt};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::generation::AnswerStream;
use crate::server::state::AppState;
use crate::types::{
    ComparisonRequest, ModelsResponse, QueryRequest, QueryResponse, StreamRecord, UploadedDocument,
};

const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// POST /api/rag/chat - Answer a question from the index
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let start = Instant::now();
    tracing::info!("Query: \"{}\"", request.query);

    let answer = state.pipeline().submit_query(&request).await?;
    Ok(Json(QueryResponse::new(answer, elapsed_ms(start))))
}

/// POST /api/rag/chat/stream - Answer a question as NDJSON records
pub async fn chat_stream(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Response> {
    tracing::info!("Streaming query: \"{}\"", request.query);

    let model = state.pipeline().resolve_model(request.model.as_deref());
    let events = state.pipeline().submit_query_stream(&request).await?;
    Ok(ndjson_response(events, model))
}

/// POST /api/rag/compare - Compare two documents
pub async fn compare(
    State(state): State<AppState>,
    Json(request): Json<ComparisonRequest>,
) -> Result<Json<QueryResponse>> {
    let start = Instant::now();

    let answer = state.pipeline().submit_comparison(&request).await?;
    Ok(Json(QueryResponse::new(answer, elapsed_ms(start))))
}

/// POST /api/rag/compare/stream - Compare two documents as NDJSON records
pub async fn compare_stream(
    State(state): State<AppState>,
    Json(request): Json<ComparisonRequest>,
) -> Result<Response> {
    let model = state.pipeline().resolve_model(request.model.as_deref());
    let events = state.pipeline().submit_comparison_stream(&request).await?;
    Ok(ndjson_response(events, model))
}

/// POST /api/rag/chat/file - Answer a question about an uploaded file
///
/// Multipart fields: `query`, `file`, and optionally `model`.
pub async fn chat_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<QueryResponse>> {
    let start = Instant::now();

    let mut query = None;
    let mut model = None;
    let mut document = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        Error::invalid_input(format!("Failed to read multipart field: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "query" => {
                query = Some(field.text().await.map_err(|e| {
                    Error::invalid_input(format!("Failed to read query: {}", e))
                })?);
            }
            "model" => {
                model = Some(field.text().await.map_err(|e| {
                    Error::invalid_input(format!("Failed to read model: {}", e))
                })?);
            }
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(|e| {
                    Error::invalid_input(format!("Failed to read file: {}", e))
                })?;
                tracing::info!("Received file: {} ({} bytes)", filename, data.len());
                document = Some(UploadedDocument::new(filename, data.to_vec()));
            }
            _ => tracing::debug!("Ignoring multipart field '{}'", name),
        }
    }

    let query = query.ok_or_else(|| Error::invalid_input("query field is required"))?;
    let document = document.ok_or_else(|| Error::invalid_input("file field is required"))?;

    let mut request = QueryRequest::new(query);
    if let Some(model) = model {
        request = request.with_model(model);
    }

    let answer = state
        .pipeline()
        .submit_query_with_document(&request, document)
        .await?;
    Ok(Json(QueryResponse::new(answer, elapsed_ms(start))))
}

/// GET /api/rag/models - List generation models offered to callers
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.pipeline().available_models(),
    })
}

fn ndjson_response(events: AnswerStream, model: String) -> Response {
    (
        [(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)],
        Body::from_stream(ndjson_lines(events, model)),
    )
        .into_response()
}

/// One JSON record per line for every event
fn ndjson_lines(
    events: AnswerStream,
    model: String,
) -> impl Stream<Item = Result<Vec<u8>>> + Send + 'static {
    events.map(move |event| -> Result<Vec<u8>> {
        let mut line = serde_json::to_vec(&StreamRecord::from_event(event, &model))?;
        line.push(b'\n');
        Ok(line)
    })
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
