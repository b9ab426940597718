//! Query, comparison and uploaded-document pipelines
//!
//! Every request follows the same path: admission (classifier verdict or
//! mode validation), gated retrieval, prompt assembly, then one-shot or
//! streaming generation with a sources block attached.

use std::sync::Arc;

use crate::classification::QueryClassifier;
use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::templates::{
    no_context_answer, EMPTY_COMPARISON_RESPONSE, EMPTY_FILE_RESPONSE, EMPTY_QUERY_RESPONSE,
    NO_COMPARISON_CONTEXT,
};
use crate::generation::{
    error_stream, format_sources_as_markdown, format_upload_sources, immediate_stream,
    AnswerStream, DocumentInput, PromptBuilder, ResponseGenerator,
};
use crate::ingestion::{DocumentNormalizer, FileParser, TextChunker};
use crate::providers::{
    EmbeddingProvider, GenerationOptions, LlmProvider, Providers, VectorStoreProvider,
};
use crate::retrieval::RetrievalGate;
use crate::types::{Answer, ComparisonMode, ComparisonRequest, QueryRequest, UploadedDocument};

/// Outcome of the steps that run before generation
enum Prepared {
    /// Answer known without calling the generation model
    Immediate(Answer),
    /// Prompt ready for the generation model
    Generate(GenerationJob),
}

struct GenerationJob {
    prompt: String,
    model: String,
    options: GenerationOptions,
    sources: String,
    empty_fallback: &'static str,
}

/// The retrieval-augmented answering pipeline
pub struct RagPipeline {
    classifier: QueryClassifier,
    gate: RetrievalGate,
    generator: ResponseGenerator,
    normalizer: DocumentNormalizer,
    config: RagConfig,
}

impl RagPipeline {
    /// Create a pipeline over explicit provider handles
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        let classifier = QueryClassifier::new(Arc::clone(&llm), &config.llm, &config.classifier);
        let gate = RetrievalGate::new(embedder, store, config.retrieval.relevance_threshold);

        Self {
            classifier,
            gate,
            generator: ResponseGenerator::new(llm),
            normalizer: DocumentNormalizer::new(),
            config,
        }
    }

    /// Create a pipeline from shared provider handles
    pub fn from_providers(config: RagConfig, providers: &Providers) -> Self {
        Self::new(
            config,
            Arc::clone(&providers.embedder),
            Arc::clone(&providers.store),
            Arc::clone(&providers.llm),
        )
    }

    /// Create a pipeline with the backends named in `config`
    pub fn from_config(config: RagConfig) -> Result<Self> {
        config.validate()?;
        let providers = Providers::from_config(&config)?;
        Ok(Self::from_providers(config, &providers))
    }

    /// Active configuration
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Generation models offered to callers
    pub fn available_models(&self) -> Vec<String> {
        self.config.llm.available_models.clone()
    }

    /// Requested model, or the configured default when absent or blank
    pub fn resolve_model(&self, requested: Option<&str>) -> String {
        match requested.map(str::trim) {
            Some(model) if !model.is_empty() => model.to_string(),
            _ => self.config.llm.generate_model.clone(),
        }
    }

    /// Answer a question from the index
    pub async fn submit_query(&self, request: &QueryRequest) -> Result<Answer> {
        let prepared = self.prepare_query(request).await?;
        self.complete(prepared).await
    }

    /// Answer a question from the index as a stream of events
    ///
    /// Only rejected input is returned as `Err`; upstream failures become a
    /// stream holding a single error event.
    pub async fn submit_query_stream(&self, request: &QueryRequest) -> Result<AnswerStream> {
        let prepared = self.prepare_query(request).await;
        self.stream(prepared)
    }

    /// Compare two documents under the requested mode
    pub async fn submit_comparison(&self, request: &ComparisonRequest) -> Result<Answer> {
        let prepared = self.prepare_comparison(request).await?;
        self.complete(prepared).await
    }

    /// Compare two documents as a stream of events
    pub async fn submit_comparison_stream(
        &self,
        request: &ComparisonRequest,
    ) -> Result<AnswerStream> {
        let prepared = self.prepare_comparison(request).await;
        self.stream(prepared)
    }

    /// Answer a question about an uploaded document, backed by the index
    pub async fn submit_query_with_document(
        &self,
        request: &QueryRequest,
        document: UploadedDocument,
    ) -> Result<Answer> {
        let prepared = self.prepare_file_query(request, document).await?;
        self.complete(prepared).await
    }

    async fn prepare_query(&self, request: &QueryRequest) -> Result<Prepared> {
        let verdict = self.classifier.classify(&request.query).await?;
        if let Some(message) = verdict.caller_message() {
            return Ok(Prepared::Immediate(Answer::guidance(message)));
        }

        let query = request.query.trim();
        let collection = self.collection(request.collection_name.as_deref());
        let retrieval = self
            .gate
            .retrieve(query, collection, self.config.retrieval.top_k)
            .await?;

        let language = self.config.prompts.language;
        if !retrieval.is_usable() {
            tracing::info!(query, "No usable context, returning fallback answer");
            return Ok(Prepared::Immediate(Answer::no_context(
                no_context_answer(language).to_string(),
            )));
        }

        let prompt = PromptBuilder::build_query_prompt(language, query, &retrieval.context());

        Ok(Prepared::Generate(GenerationJob {
            prompt,
            model: self.resolve_model(request.model.as_deref()),
            options: GenerationOptions::for_query(&self.config.llm),
            sources: format_sources_as_markdown(retrieval.source_ids()),
            empty_fallback: EMPTY_QUERY_RESPONSE,
        }))
    }

    async fn prepare_comparison(&self, request: &ComparisonRequest) -> Result<Prepared> {
        let mode: ComparisonMode = request.mode.parse()?;

        let fields = [
            ("file1_name", &request.file1_name),
            ("file1_content", &request.file1_content),
            ("file2_name", &request.file2_name),
            ("file2_content", &request.file2_content),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(Error::invalid_input(format!("{} is required", field)));
        }

        tracing::info!(
            file1 = %request.file1_name,
            file2 = %request.file2_name,
            mode = %mode,
            "Comparing documents"
        );

        let normalizer = self.normalizer;
        let contents = (request.file1_content.clone(), request.file2_content.clone());
        let (first, second) = tokio::task::spawn_blocking(move || {
            (normalizer.clean(&contents.0), normalizer.clean(&contents.1))
        })
        .await
        .map_err(|e| Error::internal(format!("Document cleaning task failed: {}", e)))?;

        let query = format!(
            "Compare electrical standards {} and {} technical specifications requirements compliance",
            request.file1_name, request.file2_name
        );
        let collection = self.collection(request.collection_name.as_deref());
        let retrieval = self
            .gate
            .retrieve(&query, collection, self.config.retrieval.comparison_top_k)
            .await?;

        // The documents are the primary input, so missing context is not a fallback case
        let (context, sources) = if retrieval.is_usable() {
            (retrieval.context(), format_sources_as_markdown(retrieval.source_ids()))
        } else {
            (NO_COMPARISON_CONTEXT.to_string(), String::new())
        };

        let prompt = PromptBuilder::build_comparison_prompt(
            self.config.prompts.language,
            mode,
            &context,
            DocumentInput::new(&request.file1_name, &first),
            DocumentInput::new(&request.file2_name, &second),
            self.config.prompts.max_document_chars,
        );

        Ok(Prepared::Generate(GenerationJob {
            prompt,
            model: self.resolve_model(request.model.as_deref()),
            options: GenerationOptions::for_comparison(&self.config.llm),
            sources,
            empty_fallback: EMPTY_COMPARISON_RESPONSE,
        }))
    }

    async fn prepare_file_query(
        &self,
        request: &QueryRequest,
        document: UploadedDocument,
    ) -> Result<Prepared> {
        let filename = document.filename.clone();
        let parsed = tokio::task::spawn_blocking(move || {
            FileParser::parse(&document.filename, &document.data)
        })
        .await
        .map_err(|e| Error::internal(format!("File parsing task failed: {}", e)))??;

        let prompts = &self.config.prompts;
        let sections = TextChunker::new(prompts.upload_chunk_size, prompts.upload_chunk_overlap)
            .chunk(&parsed.content);
        tracing::info!(filename = %filename, sections = sections.len(), "Uploaded document parsed");

        let verdict = self.classifier.classify(&request.query).await?;
        if let Some(message) = verdict.caller_message() {
            return Ok(Prepared::Immediate(Answer::guidance(message)));
        }

        let query = request.query.trim();
        let collection = self.collection(request.collection_name.as_deref());
        let retrieval = self
            .gate
            .retrieve(query, collection, self.config.retrieval.top_k)
            .await?;

        let (reference, index_sources) = if retrieval.is_usable() {
            (
                Some(retrieval.context()),
                format_sources_as_markdown(retrieval.source_ids()),
            )
        } else {
            (None, String::new())
        };

        let prompt = PromptBuilder::build_file_prompt(
            prompts.language,
            query,
            &sections.join("\n\n"),
            reference.as_deref(),
        );

        Ok(Prepared::Generate(GenerationJob {
            prompt,
            model: self.resolve_model(request.model.as_deref()),
            options: GenerationOptions::for_query(&self.config.llm),
            sources: format_upload_sources(sections.len(), &index_sources),
            empty_fallback: EMPTY_FILE_RESPONSE,
        }))
    }

    async fn complete(&self, prepared: Prepared) -> Result<Answer> {
        let job = match prepared {
            Prepared::Immediate(answer) => return Ok(answer),
            Prepared::Generate(job) => job,
        };

        tracing::info!("Using model: {}", job.model);
        let text = self
            .generator
            .generate(&job.prompt, &job.model, &job.options, job.empty_fallback, &job.sources)
            .await
            .map_err(|e| {
                tracing::error!(model = %job.model, "Generation failed: {}", e);
                e
            })?;

        Ok(Answer::generated(text, job.model))
    }

    fn stream(&self, prepared: Result<Prepared>) -> Result<AnswerStream> {
        match prepared {
            Ok(Prepared::Immediate(answer)) => Ok(immediate_stream(answer.text)),
            Ok(Prepared::Generate(job)) => {
                tracing::info!("Using model: {}", job.model);
                Ok(self
                    .generator
                    .generate_stream(job.prompt, job.model, job.options, job.sources))
            }
            Err(e) if e.is_rejected_input() => Err(e),
            Err(e) => {
                tracing::error!("Request failed before generation: {}", e);
                Ok(error_stream(e.to_string()))
            }
        }
    }

    fn collection<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => &self.config.retrieval.default_collection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::TOO_SHORT_GUIDANCE;
    use crate::generation::templates::NO_CONTEXT_ANSWER_FR;
    use crate::providers::embedding::MockEmbeddingProvider;
    use crate::providers::llm::MockLlmProvider;
    use crate::providers::vector_store::MockVectorStoreProvider;
    use crate::providers::TextStream;
    use crate::types::{AnswerEvent, AnswerKind, RetrievedPassage};
    use futures::StreamExt;

    const FORMULATOR: &str = "mistral:7b";

    fn text_stream(items: Vec<Result<String>>) -> TextStream {
        Box::pin(futures::stream::iter(items))
    }

    fn pipeline(
        llm: MockLlmProvider,
        embedder: MockEmbeddingProvider,
        store: MockVectorStoreProvider,
        config: RagConfig,
    ) -> RagPipeline {
        RagPipeline::new(config, Arc::new(embedder), Arc::new(store), Arc::new(llm))
    }

    fn embedder() -> MockEmbeddingProvider {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed().returning(|_| Ok(vec![0.1, 0.2, 0.3]));
        embedder
    }

    fn store(passages: Vec<RetrievedPassage>) -> MockVectorStoreProvider {
        let mut store = MockVectorStoreProvider::new();
        store
            .expect_search()
            .returning(move |_, _, _| Ok(passages.clone()));
        store
    }

    fn unused_embedder() -> MockEmbeddingProvider {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed().times(0);
        embedder
    }

    fn unused_store() -> MockVectorStoreProvider {
        let mut store = MockVectorStoreProvider::new();
        store.expect_search().times(0);
        store
    }

    fn classifier_replies(llm: &mut MockLlmProvider, reply: &'static str) {
        llm.expect_generate()
            .withf(|_, model, _| model.starts_with(FORMULATOR))
            .times(1)
            .returning(move |_, _, _| Ok(reply.to_string()));
    }

    fn passage(content: &str, score: f32, source: &str) -> RetrievedPassage {
        RetrievedPassage::new(content, score, Some(source.to_string()))
    }

    #[tokio::test]
    async fn test_too_short_query_skips_every_model() {
        let mut llm = MockLlmProvider::new();
        llm.expect_generate().times(0);
        llm.expect_generate_stream().times(0);

        let pipeline = pipeline(llm, unused_embedder(), unused_store(), RagConfig::default());
        let answer = pipeline.submit_query(&QueryRequest::new("ab")).await.unwrap();

        assert_eq!(answer.kind, AnswerKind::Guidance);
        assert_eq!(answer.text, TOO_SHORT_GUIDANCE);
    }

    #[tokio::test]
    async fn test_low_scores_return_fallback_verbatim() {
        let mut llm = MockLlmProvider::new();
        classifier_replies(&mut llm, "VALIDE : Quelle norme pour les relais ?");
        llm.expect_generate()
            .withf(|_, model, _| !model.starts_with(FORMULATOR))
            .times(0);

        let mut config = RagConfig::default();
        config.retrieval.relevance_threshold = 0.7;
        let store = store(vec![
            passage("relais", 0.5, "IEC 61810-1.pdf:3:0"),
            passage("compteur", 0.3, "IEC 62053-21.pdf:8:1"),
        ]);

        let pipeline = pipeline(llm, embedder(), store, config);
        let answer = pipeline
            .submit_query(&QueryRequest::new("Quelle norme pour les relais ?"))
            .await
            .unwrap();

        assert_eq!(answer.kind, AnswerKind::NoContext);
        assert_eq!(answer.text, NO_CONTEXT_ANSWER_FR);
        assert!(answer.model.is_none());
    }

    #[tokio::test]
    async fn test_end_to_end_answer_with_sources() {
        let mut llm = MockLlmProvider::new();
        classifier_replies(&mut llm, "VALIDE : Expliquez la norme IEC 61850");
        llm.expect_generate()
            .withf(|prompt, model, options| {
                model.starts_with("mistral-small3.1")
                    && options.num_ctx == 10500
                    && prompt.contains("Expliquez la norme IEC 61850")
                    && prompt.contains("La norme IEC 61850 définit la communication des postes")
            })
            .times(1)
            .returning(|_, _, _| {
                Ok("La norme IEC 61850 définit les protocoles de communication des postes électriques.".to_string())
            });

        let store = store(vec![passage(
            "La norme IEC 61850 définit la communication des postes",
            0.85,
            "data/IEC 61850.pdf:12:0",
        )]);

        let pipeline = pipeline(llm, embedder(), store, RagConfig::default());
        let answer = pipeline
            .submit_query(&QueryRequest::new("Expliquez la norme IEC 61850"))
            .await
            .unwrap();

        assert_eq!(answer.kind, AnswerKind::Generated);
        assert_eq!(answer.model.as_deref(), Some("mistral-small3.1:latest"));
        assert!(answer
            .text
            .ends_with("\n\n**Sources:**\n* **IEC 61850.pdf**, page *12*"));
    }

    #[tokio::test]
    async fn test_reformulation_suggestion() {
        let mut llm = MockLlmProvider::new();
        classifier_replies(
            &mut llm,
            "SUGGESTION_REFORMULATION : Quelles exigences définit la norme IEC 61850 ?",
        );

        let pipeline = pipeline(llm, unused_embedder(), unused_store(), RagConfig::default());
        let answer = pipeline
            .submit_query(&QueryRequest::new("61850 ça marche comment"))
            .await
            .unwrap();

        assert_eq!(answer.kind, AnswerKind::Guidance);
        assert_eq!(
            answer.text,
            "Je n'ai pas compris votre question. Peut-être que vous vouliez dire : \"Quelles exigences définit la norme IEC 61850 ?\" ?"
        );
    }

    #[tokio::test]
    async fn test_generation_failure_is_surfaced() {
        let mut llm = MockLlmProvider::new();
        classifier_replies(&mut llm, "VALIDE");
        llm.expect_generate()
            .withf(|_, model, _| !model.starts_with(FORMULATOR))
            .returning(|_, _, _| Err(Error::llm("model not found")));

        let store = store(vec![passage("IEC 60688", 0.9, "IEC 60688.pdf:1:0")]);
        let pipeline = pipeline(llm, embedder(), store, RagConfig::default());
        let err = pipeline
            .submit_query(&QueryRequest::new("Convertisseurs de mesure IEC 60688"))
            .await
            .unwrap_err();

        assert!(err.is_upstream_failure());
    }

    #[tokio::test]
    async fn test_stream_success_has_single_terminal_event() {
        let mut llm = MockLlmProvider::new();
        classifier_replies(&mut llm, "VALIDE");
        llm.expect_generate_stream()
            .withf(|_, model, _| model.contains("qwen3:32b"))
            .times(1)
            .returning(|_, _, _| {
                Ok(text_stream(vec![
                    Ok("Classe ".to_string()),
                    Ok("0,5S".to_string()),
                ]))
            });

        let store = store(vec![passage("précision", 0.8, "IEC 62053-22.pdf:4:0")]);
        let pipeline = pipeline(llm, embedder(), store, RagConfig::default());
        let request =
            QueryRequest::new("Classe de précision IEC 62053-22").with_model("qwen3:32b");

        let events: Vec<AnswerEvent> = pipeline
            .submit_query_stream(&request)
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        assert_eq!(events[0], AnswerEvent::Content("Classe ".into()));
        assert_eq!(
            events.last(),
            Some(&AnswerEvent::Sources(
                "\n\n**Sources:**\n* **IEC 62053-22.pdf**, page *4*".into()
            ))
        );
    }

    #[tokio::test]
    async fn test_stream_classifier_failure_is_single_error_event() {
        let mut llm = MockLlmProvider::new();
        llm.expect_generate()
            .returning(|_, _, _| Err(Error::llm("connection refused")));
        llm.expect_generate_stream().times(0);

        let pipeline = pipeline(llm, unused_embedder(), unused_store(), RagConfig::default());
        let events: Vec<AnswerEvent> = pipeline
            .submit_query_stream(&QueryRequest::new("Transformateurs de courant"))
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            AnswerEvent::Error(msg) if msg.contains("connection refused")
        ));
    }

    #[tokio::test]
    async fn test_stream_guidance_ends_with_empty_sources() {
        let llm = MockLlmProvider::new();
        let pipeline = pipeline(llm, unused_embedder(), unused_store(), RagConfig::default());

        let events: Vec<AnswerEvent> = pipeline
            .submit_query_stream(&QueryRequest::new("?"))
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(
            events,
            vec![
                AnswerEvent::Content(TOO_SHORT_GUIDANCE.to_string()),
                AnswerEvent::Sources(String::new()),
            ]
        );
    }

    #[tokio::test]
    async fn test_bogus_mode_rejected_before_any_call() {
        let mut llm = MockLlmProvider::new();
        llm.expect_generate().times(0);
        llm.expect_generate_stream().times(0);
        let pipeline = pipeline(llm, unused_embedder(), unused_store(), RagConfig::default());

        let request = ComparisonRequest::new("a.pdf", "contenu A", "b.pdf", "contenu B", "bogus");
        let err = pipeline.submit_comparison(&request).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedComparisonMode { .. }));

        let err = pipeline.submit_comparison_stream(&request).await.err();
        assert!(matches!(err, Some(Error::UnsupportedComparisonMode { .. })));
    }

    #[tokio::test]
    async fn test_comparison_requires_both_documents() {
        let llm = MockLlmProvider::new();
        let pipeline = pipeline(llm, unused_embedder(), unused_store(), RagConfig::default());

        let request = ComparisonRequest::new("a.pdf", "contenu", "b.pdf", "   ", "technical");
        let err = pipeline.submit_comparison(&request).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(msg) if msg.contains("file2_content")));
    }

    #[tokio::test]
    async fn test_comparison_without_context() {
        let mut llm = MockLlmProvider::new();
        llm.expect_generate()
            .withf(|prompt, _, options| {
                options.num_ctx == 16384
                    && prompt.contains("No specific context found in knowledge base.")
                    && prompt.contains("**Document 1 : IEC 62053-21.pdf**\nCompteurs classe 1")
                    && !prompt.contains("<b>")
            })
            .times(1)
            .returning(|_, _, _| Ok("Les deux normes diffèrent par leur portée.".to_string()));

        let mut store = MockVectorStoreProvider::new();
        store
            .expect_search()
            .withf(|_, _, top_k| *top_k == 5)
            .returning(|_, _, _| Ok(vec![passage("hors sujet", 0.2, "autre.pdf:1:0")]));

        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed()
            .withf(|text| {
                text.contains(
                    "Compare electrical standards IEC 62053-21.pdf and EN50470-3.pdf technical specifications requirements compliance",
                )
            })
            .returning(|_| Ok(vec![0.4, 0.1]));

        let pipeline = pipeline(llm, embedder, store, RagConfig::default());
        let request = ComparisonRequest::new(
            "IEC 62053-21.pdf",
            "<b>Compteurs classe 1</b>",
            "EN50470-3.pdf",
            "Compteurs MID classe B",
            "differences",
        );

        let answer = pipeline.submit_comparison(&request).await.unwrap();
        assert_eq!(answer.text, "Les deux normes diffèrent par leur portée.");
    }

    #[tokio::test]
    async fn test_empty_comparison_output_uses_fallback() {
        let mut llm = MockLlmProvider::new();
        llm.expect_generate().returning(|_, _, _| Ok(String::new()));

        let pipeline = pipeline(
            llm,
            embedder(),
            store(vec![passage("contexte", 0.9, "IEC 61869-2.pdf:5:0")]),
            RagConfig::default(),
        );
        let request =
            ComparisonRequest::new("a.pdf", "texte A", "b.pdf", "texte B", "similarities");

        let answer = pipeline.submit_comparison(&request).await.unwrap();
        assert_eq!(answer.text, EMPTY_COMPARISON_RESPONSE);
    }

    #[tokio::test]
    async fn test_query_with_uploaded_text_file() {
        let mut llm = MockLlmProvider::new();
        classifier_replies(&mut llm, "VALIDE");
        llm.expect_generate()
            .withf(|prompt, model, _| {
                !model.starts_with(FORMULATOR)
                    && prompt.contains("UPLOADED DOCUMENT CONTENT:\nCompteur triphasé classe 0,5S.")
                    && !prompt.contains("ADDITIONAL REFERENCE MATERIALS:")
            })
            .times(1)
            .returning(|_, _, _| Ok("La classe de précision est 0,5S.".to_string()));

        let store = store(vec![passage("faible", 0.1, "IEC 62053-22.pdf:2:0")]);
        let pipeline = pipeline(llm, embedder(), store, RagConfig::default());

        let document = UploadedDocument::new(
            "fiche.txt",
            "Compteur triphasé classe 0,5S.".as_bytes().to_vec(),
        );
        let answer = pipeline
            .submit_query_with_document(
                &QueryRequest::new("Quelle est la classe de précision ?"),
                document,
            )
            .await
            .unwrap();

        assert_eq!(
            answer.text,
            "La classe de précision est 0,5S.\n\n**Sources:**\n* **Document téléchargé** (1 sections analysées)"
        );
    }

    #[tokio::test]
    async fn test_uploaded_file_with_unknown_type_is_rejected() {
        let mut llm = MockLlmProvider::new();
        llm.expect_generate().times(0);
        let pipeline = pipeline(llm, unused_embedder(), unused_store(), RagConfig::default());

        let err = pipeline
            .submit_query_with_document(
                &QueryRequest::new("Que contient ce fichier ?"),
                UploadedDocument::new("mesures.xlsx", vec![0x50, 0x4B]),
            )
            .await
            .unwrap_err();

        assert!(err.is_rejected_input());
    }

    #[test]
    fn test_model_resolution() {
        let pipeline = pipeline(
            MockLlmProvider::new(),
            MockEmbeddingProvider::new(),
            MockVectorStoreProvider::new(),
            RagConfig::default(),
        );

        assert_eq!(pipeline.resolve_model(None), "mistral-small3.1:latest");
        assert_eq!(pipeline.resolve_model(Some("  ")), "mistral-small3.1:latest");
        assert_eq!(pipeline.resolve_model(Some("qwq:32b")), "qwq:32b");
        assert!(pipeline.available_models().contains(&"qwen3:32b".to_string()));
        assert_eq!(pipeline.collection(Some("")), "normes");
        assert_eq!(pipeline.collection(Some("normes_v2")), "normes_v2");
    }
}
