//! Ollama API client for embeddings and generation with retry logic

use futures_util::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::{GenerationOptions, TextStream};

/// Ollama API client with automatic retry
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: LlmConfig,
    /// Maximum retries
    max_retries: u32,
    /// Bound on one-shot requests and on each wait for a streamed chunk
    request_timeout: Duration,
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    num_ctx: u32,
}

impl From<&GenerationOptions> for GenerateOptions {
    fn from(options: &GenerationOptions) -> Self {
        Self {
            temperature: options.temperature,
            num_predict: options.num_predict,
            num_ctx: options.num_ctx,
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Deserialize)]
struct TagModel {
    name: String,
}

/// One line of a streamed `/api/generate` response
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaClient {
    /// Create a new Ollama client with retry support
    ///
    /// The HTTP client has no total timeout: streamed answers may run far
    /// longer than any single request. One-shot calls set their own bound.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            request_timeout: Duration::from_secs(config.timeout_secs),
            config: config.clone(),
        })
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        tracing::warn!(
                            "Request failed (attempt {}/{}), retrying in {:?}",
                            attempt + 1,
                            self.max_retries + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Llm("Unknown error".to_string())))
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.config.base_url);

        match self.client.get(&url).timeout(self.request_timeout).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Names of the models installed on the Ollama server
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("Model listing failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Llm(format!(
                "Model listing failed: HTTP {}",
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("Failed to parse model list: {}", e)))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Generate an embedding using Ollama with retry
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.config.base_url);
        let text = text.to_string();
        let model = self.config.embed_model.clone();
        let client = self.client.clone();
        let request_timeout = self.request_timeout;

        self.retry_request(|| {
            let url = url.clone();
            let text = text.clone();
            let model = model.clone();
            let client = client.clone();

            async move {
                let request = EmbedRequest {
                    model,
                    prompt: text,
                };

                let response = client
                    .post(&url)
                    .json(&request)
                    .timeout(request_timeout)
                    .send()
                    .await
                    .map_err(|e| Error::embedding(format!("Embedding request failed: {}", e)))?;

                if !response.status().is_success() {
                    return Err(Error::embedding(format!(
                        "Embedding failed: HTTP {}",
                        response.status()
                    )));
                }

                let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                    Error::embedding(format!("Failed to parse embedding response: {}", e))
                })?;

                if embed_response.embedding.is_empty() {
                    return Err(Error::embedding("Ollama returned an empty embedding"));
                }

                Ok(embed_response.embedding)
            }
        })
        .await
    }

    /// Generate a complete response with retry logic
    pub async fn generate(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let url = format!("{}/api/generate", self.config.base_url);
        let prompt = prompt.to_string();
        let model = model.to_string();
        let options = *options;
        let client = self.client.clone();
        let request_timeout = self.request_timeout;

        tracing::info!("Generating answer with model: {}", model);

        self.retry_request(|| {
            let url = url.clone();
            let prompt = prompt.clone();
            let model = model.clone();
            let client = client.clone();

            async move {
                let request = GenerateRequest {
                    model,
                    prompt,
                    stream: false,
                    options: GenerateOptions::from(&options),
                };

                let response = client
                    .post(&url)
                    .json(&request)
                    .timeout(request_timeout)
                    .send()
                    .await
                    .map_err(|e| Error::Llm(format!("Generation request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::Llm(format!(
                        "Generation failed: HTTP {} - {}",
                        status, body
                    )));
                }

                let generate_response: GenerateResponse = response.json().await.map_err(|e| {
                    Error::Llm(format!("Failed to parse generation response: {}", e))
                })?;

                Ok(generate_response.response)
            }
        })
        .await
    }

    /// Generate a streaming response
    ///
    /// Not retried: once fragments have been handed out a retry would
    /// duplicate them. There is no bound on the whole answer, only on the
    /// wait for the response headers and for each following chunk.
    pub async fn generate_stream(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerationOptions,
    ) -> Result<TextStream> {
        let url = format!("{}/api/generate", self.config.base_url);

        let request = GenerateRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            stream: true,
            options: GenerateOptions::from(options),
        };

        tracing::info!("Streaming answer with model: {}", model);

        let response = timeout(
            self.request_timeout,
            self.client.post(&url).json(&request).send(),
        )
        .await
        .map_err(|_| {
            Error::Llm(format!(
                "Stream request timed out after {:?}",
                self.request_timeout
            ))
        })?
        .map_err(|e| Error::Llm(format!("Stream request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!(
                "Stream failed: HTTP {} - {}",
                status, body
            )));
        }

        Ok(decode_generation_stream(
            response.bytes_stream(),
            self.request_timeout,
        ))
    }
}

/// Turn raw `/api/generate` stream bytes into text fragments
///
/// Each chunk must arrive within `idle_timeout` of the previous one; a
/// stalled stream ends with an error.
fn decode_generation_stream<S, B, E>(bytes: S, idle_timeout: Duration) -> TextStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut bytes = Box::pin(bytes);
        let mut decoder = NdjsonDecoder::default();

        loop {
            let chunk = match timeout(idle_timeout, bytes.next()).await {
                Ok(Some(Ok(chunk))) => chunk,
                Ok(Some(Err(e))) => {
                    yield Err(Error::Llm(format!("Stream error: {}", e)));
                    return;
                }
                Ok(None) => break,
                Err(_) => {
                    yield Err(Error::Llm(format!(
                        "Stream stalled: no data for {:?}",
                        idle_timeout
                    )));
                    return;
                }
            };

            for line in decoder.push(chunk.as_ref()) {
                match parse_stream_line(&line) {
                    Ok(Some(chunk)) => {
                        if !chunk.response.is_empty() {
                            yield Ok(chunk.response);
                        }
                        if chunk.done {
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }

        if let Some(line) = decoder.finish() {
            match parse_stream_line(&line) {
                Ok(Some(chunk)) if !chunk.response.is_empty() => {
                    yield Ok(chunk.response);
                }
                Ok(_) => {}
                Err(e) => {
                    yield Err(e);
                }
            }
        }
    };

    Box::pin(stream)
}

/// Splits a byte stream into complete newline-terminated lines
///
/// Network chunks do not respect line (or UTF-8) boundaries, so partial
/// lines are buffered until their terminator arrives.
#[derive(Debug, Default)]
pub(crate) struct NdjsonDecoder {
    buffer: Vec<u8>,
}

impl NdjsonDecoder {
    /// Feed bytes and return every line completed by them
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            let line = line.trim();
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }
        lines
    }

    /// Flush a trailing line that had no terminator
    pub(crate) fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let rest = String::from_utf8_lossy(&rest);
        let rest = rest.trim();
        (!rest.is_empty()).then(|| rest.to_string())
    }
}

fn parse_stream_line(line: &str) -> Result<Option<StreamChunk>> {
    let chunk: StreamChunk = match serde_json::from_str(line) {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::warn!("Skipping malformed stream line: {}", e);
            return Ok(None);
        }
    };

    if let Some(error) = chunk.error {
        return Err(Error::Llm(format!("Ollama stream error: {}", error)));
    }

    Ok(Some(chunk))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_joins_split_lines() {
        let mut decoder = NdjsonDecoder::default();

        let first = decoder.push(b"{\"response\":\"La \",\"done\":false}\n{\"respo");
        assert_eq!(first, vec![r#"{"response":"La ","done":false}"#.to_string()]);

        let second = decoder.push(b"nse\":\"norme\",\"done\":false}\n");
        assert_eq!(second, vec![r#"{"response":"norme","done":false}"#.to_string()]);

        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_decoder_keeps_multibyte_chars_across_chunks() {
        let mut decoder = NdjsonDecoder::default();
        let line = "{\"response\":\"é\",\"done\":true}\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;

        assert!(decoder.push(&line[..split]).is_empty());
        let lines = decoder.push(&line[split..]);

        let chunk = parse_stream_line(&lines[0]).unwrap().unwrap();
        assert_eq!(chunk.response, "é");
        assert!(chunk.done);
    }

    #[test]
    fn test_decoder_flushes_unterminated_tail() {
        let mut decoder = NdjsonDecoder::default();
        assert!(decoder.push(b"{\"response\":\"fin\",\"done\":true}").is_empty());
        assert_eq!(
            decoder.finish().as_deref(),
            Some(r#"{"response":"fin","done":true}"#)
        );
    }

    #[test]
    fn test_stream_error_line() {
        let err = parse_stream_line(r#"{"error":"model not found"}"#).unwrap_err();
        assert!(matches!(err, Error::Llm(_)));
        assert!(parse_stream_line("not json").unwrap().is_none());
    }

    fn line(text: &str, done: bool) -> Vec<u8> {
        format!("{}\n", serde_json::json!({ "response": text, "done": done })).into_bytes()
    }

    fn delayed_chunks(
        chunks: Vec<Vec<u8>>,
        gap: Duration,
    ) -> impl Stream<Item = std::result::Result<Vec<u8>, String>> + Send + 'static {
        futures_util::stream::iter(chunks).then(move |chunk| async move {
            sleep(gap).await;
            Ok::<_, String>(chunk)
        })
    }

    #[tokio::test]
    async fn test_slow_stream_outlives_idle_timeout() {
        let chunks = vec![
            line("La ", false),
            line("norme ", false),
            line("IEC ", false),
            line("61850", false),
            line("", true),
        ];
        // Whole answer takes longer than the per-chunk bound
        let stream = decode_generation_stream(
            delayed_chunks(chunks, Duration::from_millis(100)),
            Duration::from_millis(300),
        );

        let fragments: Vec<String> = stream.map(|item| item.unwrap()).collect().await;
        assert_eq!(fragments.concat(), "La norme IEC 61850");
    }

    #[tokio::test]
    async fn test_stalled_stream_ends_with_error() {
        let first = futures_util::stream::iter(vec![Ok::<_, String>(line("Début", false))]);
        let stream = decode_generation_stream(
            first.chain(futures_util::stream::pending()),
            Duration::from_millis(50),
        );

        let items: Vec<Result<String>> = stream.collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "Début");
        let err = items[1].as_ref().unwrap_err();
        assert!(err.to_string().contains("stalled"));
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let chunks = futures_util::stream::iter(vec![
            Ok(line("Avant", false)),
            Err("connection reset".to_string()),
        ]);
        let items: Vec<Result<String>> =
            decode_generation_stream(chunks, Duration::from_secs(1)).collect().await;

        assert_eq!(items.len(), 2);
        assert!(items[1]
            .as_ref()
            .unwrap_err()
            .to_string()
            .contains("connection reset"));
    }

    #[test]
    fn test_client_builds_from_default_config() {
        let client = OllamaClient::new(&LlmConfig::default());
        assert!(client.is_ok());
    }
}
