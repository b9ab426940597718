//! Query verdicts and the parser for the auxiliary model's tagged output

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Document categories the assistant can help with, listed in guidance text
pub const SUPPORTED_DOCUMENT_TYPES: [&str; 10] = [
    "Technical specifications",
    "User manuals",
    "Installation guides",
    "Process documentation",
    "Policy documents",
    "Research papers",
    "Standards and regulations",
    "API documentation",
    "Configuration guides",
    "Training materials",
];

/// Guidance for queries under the minimum length
pub const TOO_SHORT_GUIDANCE: &str =
    "Votre requête est trop courte. Veuillez fournir plus de détails.";

/// Guidance for a correction verdict whose payload could not be split
pub const GENERIC_CORRECTION_GUIDANCE: &str =
    "Votre requête semble contenir une erreur. Veuillez vérifier et reformuler votre question.";

/// A reasoning block, or an unclosed one running to the end of the reply
static THINK_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?(?:</think>|\z)").expect("valid regex"));

/// The classifier's judgment of whether a query may proceed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryVerdict {
    /// The query can be answered as submitted
    Valid { query: String },
    /// On topic but vague; a clearer wording is suggested
    NeedsReformulation { suggestion: String, guidance: String },
    /// Probably misspells a technical term
    NeedsCorrection {
        corrected: Option<String>,
        guidance: String,
    },
    /// Outside the supported document domain
    NonRelevant { guidance: String },
    /// Below the minimum length
    TooShort { guidance: String },
}

impl QueryVerdict {
    /// Short name used in logs
    pub fn category(&self) -> &'static str {
        match self {
            Self::Valid { .. } => "valid",
            Self::NeedsReformulation { .. } => "reformulation",
            Self::NeedsCorrection { .. } => "correction",
            Self::NonRelevant { .. } => "non_relevant",
            Self::TooShort { .. } => "too_short",
        }
    }

    /// Whether the query may proceed to retrieval
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Guidance text for every non-valid verdict
    pub fn guidance(&self) -> Option<&str> {
        match self {
            Self::Valid { .. } => None,
            Self::NeedsReformulation { guidance, .. }
            | Self::NeedsCorrection { guidance, .. }
            | Self::NonRelevant { guidance }
            | Self::TooShort { guidance } => Some(guidance),
        }
    }

    /// A ready-to-send query the caller could try instead
    pub fn suggested_query(&self) -> Option<String> {
        match self {
            Self::NeedsReformulation { suggestion, .. } if !suggestion.is_empty() => {
                Some(suggestion.clone())
            }
            Self::NeedsCorrection {
                corrected: Some(term),
                ..
            } => Some(format!("Informations sur {}", term)),
            _ => None,
        }
    }

    /// Text returned to the caller instead of an answer, `None` when valid
    pub fn caller_message(&self) -> Option<String> {
        if let Some(suggestion) = self.suggested_query() {
            return Some(format!(
                "Je n'ai pas compris votre question. Peut-être que vous vouliez dire : \"{}\" ?",
                suggestion
            ));
        }
        self.guidance().map(str::to_string)
    }

    pub(crate) fn too_short() -> Self {
        Self::TooShort {
            guidance: TOO_SHORT_GUIDANCE.to_string(),
        }
    }
}

/// Result of parsing the auxiliary model's reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierOutput {
    /// One of the known tags was found
    Verdict(QueryVerdict),
    /// No known tag; the caller decides the default
    Unrecognized(String),
}

/// Parse the auxiliary model's tagged reply for `query`
///
/// Reasoning wrapped in `<think>` blocks is dropped first; an unclosed block
/// drops everything from its opening tag. Tags are matched
/// case-insensitively as a prefix, except `NON_PERTINENT` which counts
/// anywhere in the reply.
pub fn parse_classifier_output(raw: &str, query: &str) -> ClassifierOutput {
    let without_thinking = THINK_BLOCK.replace_all(raw, "");
    let response = without_thinking.trim().trim_matches('`').trim();

    if strip_tag(response, "VALIDE").is_some() || strip_tag(response, "VALID").is_some() {
        return ClassifierOutput::Verdict(QueryVerdict::Valid {
            query: query.to_string(),
        });
    }

    if let Some(payload) = strip_tag(response, "SUGGESTION_REFORMULATION") {
        let suggestion = payload.trim_matches(|c| c == '"' || c == '`').trim().to_string();
        let guidance = format!(
            "Votre requête pourrait être plus claire. Essayez plutôt: \"{}\"",
            suggestion
        );
        return ClassifierOutput::Verdict(QueryVerdict::NeedsReformulation {
            suggestion,
            guidance,
        });
    }

    if let Some(payload) = strip_tag(response, "SUGGESTION_CORRECTION") {
        return ClassifierOutput::Verdict(parse_correction(payload));
    }

    if response.to_uppercase().contains("NON_PERTINENT") {
        return ClassifierOutput::Verdict(QueryVerdict::NonRelevant {
            guidance: non_relevant_guidance(),
        });
    }

    ClassifierOutput::Unrecognized(response.to_string())
}

/// Match `tag` at the start of `response` and return the payload after it
///
/// The tag must be followed by the end of the reply, whitespace or a colon,
/// so `VALID` does not match `VALIDATION`.
fn strip_tag<'a>(response: &'a str, tag: &str) -> Option<&'a str> {
    let head = response.get(..tag.len())?;
    if !head.eq_ignore_ascii_case(tag) {
        return None;
    }

    let rest = &response[tag.len()..];
    match rest.chars().next() {
        None => Some(""),
        Some(c) if c.is_whitespace() || c == ':' => {
            let rest = rest.trim_start();
            Some(rest.strip_prefix(':').unwrap_or(rest).trim())
        }
        Some(_) => None,
    }
}

/// Split a correction payload of the form `term | Votre requête : original`
fn parse_correction(payload: &str) -> QueryVerdict {
    let Some((term, original)) = payload.split_once('|') else {
        tracing::warn!("Unexpected SUGGESTION_CORRECTION payload: '{}'", payload);
        return QueryVerdict::NeedsCorrection {
            corrected: None,
            guidance: GENERIC_CORRECTION_GUIDANCE.to_string(),
        };
    };

    let term = term.trim();
    let original = original.trim();
    let original = match original.find(':') {
        Some(pos) if original[..pos].trim().eq_ignore_ascii_case("votre requête") => {
            original[pos + 1..].trim()
        }
        _ => original,
    };

    if term.is_empty() {
        return QueryVerdict::NeedsCorrection {
            corrected: None,
            guidance: GENERIC_CORRECTION_GUIDANCE.to_string(),
        };
    }

    QueryVerdict::NeedsCorrection {
        corrected: Some(term.to_string()),
        guidance: format!(
            "Vouliez-vous parler de '{term}' ? Votre requête originale était : \"{original}\". Si oui, essayez: \"Informations sur {term}\""
        ),
    }
}

fn non_relevant_guidance() -> String {
    format!(
        "Votre question ne semble pas concerner l'analyse de documents techniques. Je peux vous aider avec les types de documents suivants:\n- {}\n\nEssayez par exemple: \"Expliquez la procédure décrite dans le document\" ou \"Quels sont les points clés de ce manuel ?\"",
        SUPPORTED_DOCUMENT_TYPES.join("\n- ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(raw: &str) -> QueryVerdict {
        match parse_classifier_output(raw, "requête") {
            ClassifierOutput::Verdict(v) => v,
            ClassifierOutput::Unrecognized(r) => panic!("unrecognized: {r}"),
        }
    }

    #[test]
    fn test_valid_tags() {
        assert!(verdict("VALIDE : Expliquez la norme IEC 61850").is_valid());
        assert!(verdict("valid: Expliquez la norme").is_valid());
        assert!(verdict("`VALIDE : requête`").is_valid());
        assert_eq!(
            verdict("VALIDE : autre texte"),
            QueryVerdict::Valid {
                query: "requête".to_string()
            }
        );
    }

    #[test]
    fn test_think_block_is_stripped() {
        let raw = "<think>\nLa requête parle de VALIDE ou NON_PERTINENT...\n</think>\nSUGGESTION_REFORMULATION : Quelle partie de la norme ?";
        match verdict(raw) {
            QueryVerdict::NeedsReformulation { suggestion, guidance } => {
                assert_eq!(suggestion, "Quelle partie de la norme ?");
                assert_eq!(
                    guidance,
                    "Votre requête pourrait être plus claire. Essayez plutôt: \"Quelle partie de la norme ?\""
                );
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
    }

    #[test]
    fn test_unclosed_think_block_is_dropped() {
        let raw = "<think>\nLe prompt liste VALIDE et NON_PERTINENT, la requête semble";
        assert_eq!(
            parse_classifier_output(raw, "q"),
            ClassifierOutput::Unrecognized(String::new())
        );

        let raw = "VALIDE : requête <think>NON_PERTINENT";
        assert!(verdict(raw).is_valid());
    }

    #[test]
    fn test_correction_with_separator() {
        let v = verdict("SUGGESTION_CORRECTION : IEC 61850 | Votre requête : IEC 61580");
        assert_eq!(
            v,
            QueryVerdict::NeedsCorrection {
                corrected: Some("IEC 61850".to_string()),
                guidance: "Vouliez-vous parler de 'IEC 61850' ? Votre requête originale était : \"IEC 61580\". Si oui, essayez: \"Informations sur IEC 61850\"".to_string(),
            }
        );
        assert_eq!(
            v.caller_message().unwrap(),
            "Je n'ai pas compris votre question. Peut-être que vous vouliez dire : \"Informations sur IEC 61850\" ?"
        );
    }

    #[test]
    fn test_correction_without_separator_is_generic() {
        let v = verdict("SUGGESTION_CORRECTION : configuration");
        assert_eq!(v.guidance(), Some(GENERIC_CORRECTION_GUIDANCE));
        assert_eq!(v.caller_message().as_deref(), Some(GENERIC_CORRECTION_GUIDANCE));
    }

    #[test]
    fn test_non_pertinent_anywhere() {
        let v = verdict("Réponse : NON_PERTINENT");
        assert_eq!(v.category(), "non_relevant");
        let guidance = v.guidance().unwrap();
        assert!(guidance.contains("\n- Technical specifications\n- User manuals"));
        assert!(guidance.ends_with("\"Quels sont les points clés de ce manuel ?\""));
    }

    #[test]
    fn test_unrecognized_output() {
        assert_eq!(
            parse_classifier_output("Je pense que oui.", "q"),
            ClassifierOutput::Unrecognized("Je pense que oui.".to_string())
        );
        // Prefix must end at a delimiter
        assert!(matches!(
            parse_classifier_output("VALIDATION requise", "q"),
            ClassifierOutput::Unrecognized(_)
        ));
        assert!(matches!(
            parse_classifier_output("", "q"),
            ClassifierOutput::Unrecognized(_)
        ));
    }

    #[test]
    fn test_strip_tag_handles_multibyte_reply() {
        assert_eq!(strip_tag("é", "VALIDE"), None);
        assert_eq!(strip_tag("VALIDE", "VALIDE"), Some(""));
    }
}
