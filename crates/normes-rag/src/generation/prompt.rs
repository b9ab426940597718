//! Prompt assembly for queries, comparisons and uploaded documents

use crate::config::PromptLanguage;
use crate::types::ComparisonMode;

use super::templates::{self, render, TRUNCATION_MARKER};

/// One side of a comparison
#[derive(Debug, Clone, Copy)]
pub struct DocumentInput<'a> {
    /// Display name
    pub name: &'a str,
    /// Cleaned text
    pub content: &'a str,
}

impl<'a> DocumentInput<'a> {
    pub fn new(name: &'a str, content: &'a str) -> Self {
        Self { name, content }
    }
}

/// Prompt builder for every generation path
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the single-query prompt
    ///
    /// The fixed no-context answer for `language` is embedded so the model
    /// can fall back on it for out-of-scope questions.
    pub fn build_query_prompt(language: PromptLanguage, question: &str, context: &str) -> String {
        render(
            templates::query_template(language),
            &[
                ("question", question),
                ("context", context),
                ("no_context", templates::no_context_answer(language)),
            ],
        )
    }

    /// Build the prompt comparing two documents under `mode`
    ///
    /// Each document is cut to `max_document_chars` characters first.
    pub fn build_comparison_prompt(
        language: PromptLanguage,
        mode: ComparisonMode,
        context: &str,
        first: DocumentInput<'_>,
        second: DocumentInput<'_>,
        max_document_chars: usize,
    ) -> String {
        let first_content = Self::truncate_document(first.content, max_document_chars);
        let second_content = Self::truncate_document(second.content, max_document_chars);

        let documents = render(
            templates::comparison_documents_block(language),
            &[
                ("context", context),
                ("file1_name", first.name),
                ("file1_content", &first_content),
                ("file2_name", second.name),
                ("file2_content", &second_content),
            ],
        );

        render(
            templates::comparison_template(language, mode),
            &[("documents", &documents)],
        )
    }

    /// Build the prompt for a question about an uploaded document
    ///
    /// `reference` carries index passages and is only included when the
    /// caller judged them usable.
    pub fn build_file_prompt(
        language: PromptLanguage,
        question: &str,
        uploaded: &str,
        reference: Option<&str>,
    ) -> String {
        let mut context = format!("UPLOADED DOCUMENT CONTENT:\n{}\n\n", uploaded);
        if let Some(reference) = reference {
            context.push_str("ADDITIONAL REFERENCE MATERIALS:\n");
            context.push_str(reference);
        }

        render(
            templates::file_query_template(language),
            &[("question", question), ("context", &context)],
        )
    }

    /// Keep at most `max_chars` characters, marking the cut with `...`
    pub fn truncate_document(content: &str, max_chars: usize) -> String {
        match content.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}{}", &content[..cut], TRUNCATION_MARKER),
            None => content.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_prompt_embeds_inputs() {
        let prompt = PromptBuilder::build_query_prompt(
            PromptLanguage::Fr,
            "Expliquez la norme IEC 61850",
            "La norme IEC 61850 définit {question}",
        );
        assert!(prompt.contains("Expliquez la norme IEC 61850\n"));
        // Substituted text is not expanded again
        assert!(prompt.contains("La norme IEC 61850 définit {question}"));
        assert!(prompt.contains("Je n'ai pas d'information sur ce sujet."));
        assert!(!prompt.contains("{context}"));
    }

    #[test]
    fn test_english_query_prompt() {
        let prompt =
            PromptBuilder::build_query_prompt(PromptLanguage::En, "Relay standard?", "ctx");
        assert!(prompt.contains("ONLY in English"));
        assert!(prompt.contains("I do not have information on this topic."));
    }

    #[test]
    fn test_truncate_document() {
        assert_eq!(PromptBuilder::truncate_document("abcdef", 4), "abcd...");
        assert_eq!(PromptBuilder::truncate_document("abcd", 4), "abcd");
        assert_eq!(PromptBuilder::truncate_document("éèàç", 2), "éè...");
        assert_eq!(PromptBuilder::truncate_document("", 0), "");
    }

    #[test]
    fn test_comparison_prompt() {
        let long = "x".repeat(50);
        let prompt = PromptBuilder::build_comparison_prompt(
            PromptLanguage::Fr,
            ComparisonMode::Differences,
            "No specific context found in knowledge base.",
            DocumentInput::new("IEC 62053-21.pdf", &long),
            DocumentInput::new("EN50470-3.pdf", "Compteurs MID {file1_name}"),
            10,
        );

        assert!(prompt.contains("différences clés"));
        assert!(prompt.contains("**Document 1 : IEC 62053-21.pdf**\nxxxxxxxxxx...\n"));
        assert!(prompt.contains("**Document 2 : EN50470-3.pdf**\nCompteurs MID {file1_name}"));
        assert!(prompt.contains("No specific context found in knowledge base."));
        assert!(!prompt.contains("{documents}"));
    }

    #[test]
    fn test_file_prompt_reference_section() {
        let with_reference = PromptBuilder::build_file_prompt(
            PromptLanguage::En,
            "What accuracy class?",
            "Class 0.5S meter",
            Some("IEC 62053-22 passage"),
        );
        assert!(with_reference.contains(
            "UPLOADED DOCUMENT CONTENT:\nClass 0.5S meter\n\nADDITIONAL REFERENCE MATERIALS:\nIEC 62053-22 passage"
        ));

        let without = PromptBuilder::build_file_prompt(
            PromptLanguage::En,
            "What accuracy class?",
            "Class 0.5S meter",
            None,
        );
        assert!(!without.contains("ADDITIONAL REFERENCE MATERIALS"));
    }
}
