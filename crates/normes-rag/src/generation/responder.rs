//! Answer generation, one-shot and streaming

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;

use crate::error::Result;
use crate::providers::{GenerationOptions, LlmProvider};
use crate::types::AnswerEvent;

/// Events of a streamed answer, ending with exactly one terminal event
pub type AnswerStream = BoxStream<'static, AnswerEvent>;

/// Runs the generation model on an assembled prompt
#[derive(Clone)]
pub struct ResponseGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl ResponseGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Generate a complete answer and append `sources`
    ///
    /// Empty or whitespace-only output is replaced by `empty_fallback`, without
    /// sources.
    pub async fn generate(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerationOptions,
        empty_fallback: &str,
        sources: &str,
    ) -> Result<String> {
        let text = self.llm.generate(prompt, model, options).await?;

        if text.trim().is_empty() {
            tracing::warn!(model, "Model returned an empty response");
            return Ok(empty_fallback.to_string());
        }

        tracing::debug!(model, chars = text.len(), "Generated response");
        Ok(format!("{}{}", text, sources))
    }

    /// Stream an answer as content fragments followed by `sources`
    ///
    /// Any failure, at start or mid-stream, ends the stream with a single
    /// `Error` event.
    pub fn generate_stream(
        &self,
        prompt: String,
        model: String,
        options: GenerationOptions,
        sources: String,
    ) -> AnswerStream {
        let llm = Arc::clone(&self.llm);

        let stream = async_stream::stream! {
            let mut fragments = match llm.generate_stream(&prompt, &model, &options).await {
                Ok(fragments) => fragments,
                Err(e) => {
                    tracing::error!(model = %model, "Failed to start generation: {}", e);
                    yield AnswerEvent::Error(e.to_string());
                    return;
                }
            };

            let mut full_text = String::new();
            while let Some(fragment) = fragments.next().await {
                match fragment {
                    Ok(text) => {
                        if text.is_empty() {
                            continue;
                        }
                        full_text.push_str(&text);
                        yield AnswerEvent::Content(text);
                    }
                    Err(e) => {
                        tracing::error!(model = %model, "Generation stream failed: {}", e);
                        yield AnswerEvent::Error(e.to_string());
                        return;
                    }
                }
            }

            tracing::debug!(model = %model, chars = full_text.len(), "Streamed response complete");
            yield AnswerEvent::Sources(sources);
        };

        stream.boxed()
    }
}

/// Stream holding a single answer followed by an empty sources event
pub fn immediate_stream(text: String) -> AnswerStream {
    futures::stream::iter([AnswerEvent::Content(text), AnswerEvent::Sources(String::new())]).boxed()
}

/// Stream holding a single error event
pub fn error_stream(message: String) -> AnswerStream {
    futures::stream::once(async move { AnswerEvent::Error(message) }).boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use crate::error::Error;
    use crate::providers::llm::MockLlmProvider;
    use crate::providers::TextStream;

    fn text_stream(items: Vec<Result<String>>) -> TextStream {
        Box::pin(futures::stream::iter(items))
    }

    fn options() -> GenerationOptions {
        GenerationOptions::for_query(&LlmConfig::default())
    }

    #[tokio::test]
    async fn test_generate_appends_sources() {
        let mut llm = MockLlmProvider::new();
        llm.expect_generate()
            .withf(|prompt, model, _| prompt.contains("prompt") && model.contains("qwen3"))
            .returning(|_, _, _| Ok("  La norme IEC 61850 définit...\n".to_string()));

        let generator = ResponseGenerator::new(Arc::new(llm));
        let text = generator
            .generate("prompt", "qwen3:32b", &options(), "vide", "\n\n**Sources:**\n* **a.pdf**")
            .await
            .unwrap();
        // Output is kept as the model wrote it
        assert_eq!(
            text,
            "  La norme IEC 61850 définit...\n\n\n**Sources:**\n* **a.pdf**"
        );
    }

    #[tokio::test]
    async fn test_empty_output_uses_fallback() {
        let mut llm = MockLlmProvider::new();
        llm.expect_generate().returning(|_, _, _| Ok(" \n ".to_string()));

        let generator = ResponseGenerator::new(Arc::new(llm));
        let text = generator
            .generate("p", "m", &options(), "No response could be generated for this query.", "src")
            .await
            .unwrap();
        assert_eq!(text, "No response could be generated for this query.");
    }

    #[tokio::test]
    async fn test_stream_ends_with_sources() {
        let mut llm = MockLlmProvider::new();
        llm.expect_generate_stream().returning(|_, _, _| {
            Ok(text_stream(vec![
                Ok("La norme ".to_string()),
                Ok(String::new()),
                Ok("IEC 60688".to_string()),
            ]))
        });

        let generator = ResponseGenerator::new(Arc::new(llm));
        let events: Vec<AnswerEvent> = generator
            .generate_stream("p".into(), "m".into(), options(), "SRC".into())
            .collect()
            .await;

        assert_eq!(
            events,
            vec![
                AnswerEvent::Content("La norme ".into()),
                AnswerEvent::Content("IEC 60688".into()),
                AnswerEvent::Sources("SRC".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_failure_mid_way() {
        let mut llm = MockLlmProvider::new();
        llm.expect_generate_stream().returning(|_, _, _| {
            Ok(text_stream(vec![
                Ok("Début".to_string()),
                Err(Error::llm("connection reset")),
                Ok("jamais".to_string()),
            ]))
        });

        let generator = ResponseGenerator::new(Arc::new(llm));
        let events: Vec<AnswerEvent> = generator
            .generate_stream("p".into(), "m".into(), options(), "SRC".into())
            .collect()
            .await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], AnswerEvent::Content("Début".into()));
        assert!(matches!(&events[1], AnswerEvent::Error(msg) if msg.contains("connection reset")));
    }

    #[tokio::test]
    async fn test_stream_failure_at_start() {
        let mut llm = MockLlmProvider::new();
        llm.expect_generate_stream()
            .returning(|_, _, _| Err(Error::llm("model not found")));

        let generator = ResponseGenerator::new(Arc::new(llm));
        let events: Vec<AnswerEvent> = generator
            .generate_stream("p".into(), "m".into(), options(), "SRC".into())
            .collect()
            .await;

        assert_eq!(events.len(), 1);
        assert!(events[0].is_terminal());
    }

    #[tokio::test]
    async fn test_helper_streams() {
        let events: Vec<AnswerEvent> = immediate_stream("Guidance".into()).collect().await;
        assert_eq!(
            events,
            vec![AnswerEvent::Content("Guidance".into()), AnswerEvent::Sources(String::new())]
        );

        let events: Vec<AnswerEvent> = error_stream("boom".into()).collect().await;
        assert_eq!(events, vec![AnswerEvent::Error("boom".into())]);
    }
}
