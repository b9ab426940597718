//! Query admission using a small auxiliary model

use std::sync::Arc;
use std::time::Duration;

use crate::config::{ClassifierConfig, LlmConfig};
use crate::error::{Error, Result};
use crate::providers::{GenerationOptions, LlmProvider};

use super::verdict::{
    parse_classifier_output, ClassifierOutput, QueryVerdict, SUPPORTED_DOCUMENT_TYPES,
};

/// Decides whether a raw query is admissible before any retrieval happens
pub struct QueryClassifier {
    llm: Arc<dyn LlmProvider>,
    model: String,
    options: GenerationOptions,
    min_query_chars: usize,
    timeout: Duration,
}

impl QueryClassifier {
    /// Create a classifier backed by `llm`
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        llm_config: &LlmConfig,
        config: &ClassifierConfig,
    ) -> Self {
        Self {
            llm,
            model: llm_config.formulator_model.clone(),
            options: GenerationOptions::for_classifier(llm_config),
            min_query_chars: config.min_query_chars,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Override the bounded wait on the auxiliary model
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Classify a raw query
    ///
    /// Queries below the minimum length never reach the auxiliary model. An
    /// unrecognized reply lets the query through. A timeout or transport
    /// failure is returned as an error.
    pub async fn classify(&self, query: &str) -> Result<QueryVerdict> {
        if query.trim().chars().count() < self.min_query_chars {
            let verdict = QueryVerdict::too_short();
            tracing::info!(query, verdict = verdict.category(), "Query classified");
            return Ok(verdict);
        }

        let prompt = build_classifier_prompt(query);

        let raw = tokio::time::timeout(
            self.timeout,
            self.llm.generate(&prompt, &self.model, &self.options),
        )
        .await
        .map_err(|_| Error::timeout("query classification", self.timeout.as_secs()))??;

        let verdict = match parse_classifier_output(&raw, query) {
            ClassifierOutput::Verdict(verdict) => verdict,
            ClassifierOutput::Unrecognized(reply) => {
                tracing::warn!(
                    model = %self.model,
                    "Classifier returned an unexpected format, treating query as valid: '{}'",
                    reply
                );
                QueryVerdict::Valid {
                    query: query.to_string(),
                }
            }
        };

        tracing::info!(query, verdict = verdict.category(), "Query classified");
        Ok(verdict)
    }
}

/// Instruction sent to the auxiliary model
fn build_classifier_prompt(query: &str) -> String {
    format!(
        r#"Évaluez la pertinence et la clarté de la requête utilisateur : "{query}"
DOMAINE : documentation technique et analyse de documents.
TYPES PRIS EN CHARGE : {types}.
TERMES TECHNIQUES COURANTS : API, configuration, procédures, spécifications, installation, manuel, guide, documentation, norme.

Répondez UNIQUEMENT avec l'un des formats ci-dessous, sans aucune explication.

VALIDE : {query}
  si la requête est claire, exploitable et porte sur de la documentation technique (les requêtes longues et détaillées sont valides).

SUGGESTION_REFORMULATION : <question reformulée>
  si la requête est dans le domaine mais vague ou imprécise.
  Exemple : "Comment ça marche ?" -> SUGGESTION_REFORMULATION : Quel processus ou système souhaitez-vous comprendre ?

SUGGESTION_CORRECTION : <terme corrigé> | Votre requête : {query}
  si la requête contient vraisemblablement une faute de frappe sur un terme technique.
  Exemple : "configurashun" -> SUGGESTION_CORRECTION : configuration | Votre requête : configurashun

NON_PERTINENT
  si la requête est hors sujet.
  Exemple : "Quel temps fait-il ?" -> NON_PERTINENT"#,
        query = query,
        types = SUPPORTED_DOCUMENT_TYPES.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::llm::MockLlmProvider;
    use crate::providers::TextStream;
    use async_trait::async_trait;

    fn classifier(llm: impl LlmProvider + 'static) -> QueryClassifier {
        QueryClassifier::new(Arc::new(llm), &LlmConfig::default(), &ClassifierConfig::default())
    }

    #[tokio::test]
    async fn test_too_short_never_calls_model() {
        let mut llm = MockLlmProvider::new();
        llm.expect_generate().times(0);

        let verdict = classifier(llm).classify("  ab ").await.unwrap();
        assert_eq!(verdict.category(), "too_short");
        assert_eq!(
            verdict.guidance(),
            Some("Votre requête est trop courte. Veuillez fournir plus de détails.")
        );
    }

    #[tokio::test]
    async fn test_uses_formulator_model_deterministically() {
        let mut llm = MockLlmProvider::new();
        llm.expect_generate()
            .withf(|prompt, model, options| {
                model.contains("mistral:7b")
                    && options.temperature == 0.0
                    && options.num_predict.is_none()
                    && prompt.contains("\"Expliquez la norme IEC 61850\"")
            })
            .times(1)
            .returning(|_, _, _| Ok("VALIDE : Expliquez la norme IEC 61850".to_string()));

        let verdict = classifier(llm).classify("Expliquez la norme IEC 61850").await.unwrap();
        assert!(verdict.is_valid());
    }

    #[tokio::test]
    async fn test_unrecognized_reply_fails_open() {
        let mut llm = MockLlmProvider::new();
        llm.expect_generate()
            .returning(|_, _, _| Ok("Bien sûr, voici mon analyse.".to_string()));

        let verdict = classifier(llm).classify("Classe de précision 0,5S").await.unwrap();
        assert_eq!(
            verdict,
            QueryVerdict::Valid {
                query: "Classe de précision 0,5S".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_model_failure_is_upstream_error() {
        let mut llm = MockLlmProvider::new();
        llm.expect_generate()
            .returning(|_, _, _| Err(Error::llm("connection refused")));

        let err = classifier(llm).classify("Quelle est la norme des relais ?").await.unwrap_err();
        assert!(err.is_upstream_failure());
    }

    struct SlowLlm;

    #[async_trait]
    impl LlmProvider for SlowLlm {
        async fn generate(&self, _: &str, _: &str, _: &GenerationOptions) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("VALIDE".to_string())
        }

        async fn generate_stream(
            &self,
            _: &str,
            _: &str,
            _: &GenerationOptions,
        ) -> Result<TextStream> {
            Err(Error::llm("not used"))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_timeout_is_typed_failure() {
        let classifier = classifier(SlowLlm).with_timeout(Duration::from_millis(20));
        let err = classifier.classify("Expliquez la norme IEC 60688").await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }
}
