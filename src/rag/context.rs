//! Context assembly and prompt construction.
//!
//! Retrieved documents are included verbatim, in retrieval order, with no
//! truncation, dedup or score threshold.

use super::document::RetrievedDocument;

pub const BASE_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

const CONTEXT_INSTRUCTIONS: &str = "Use the following context to answer the user's question. \
If the answer cannot be found in the context, say that you don't know instead of making up an answer.";

const DOCUMENT_SEPARATOR: &str = "\n\n";

/// The system/user message pair sent to the completion backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

pub struct ContextAssembler;

impl ContextAssembler {
    /// Joins document texts with a blank line. Empty input gives `""`.
    pub fn assemble(documents: &[RetrievedDocument]) -> String {
        documents
            .iter()
            .map(|doc| doc.text.as_str())
            .collect::<Vec<_>>()
            .join(DOCUMENT_SEPARATOR)
    }

    /// Builds the prompt. The context block is appended to the base
    /// instruction only when `context` is non-empty; the query is passed
    /// through unmodified.
    pub fn build_prompt(context: &str, query_text: &str) -> Prompt {
        let system = if context.is_empty() {
            BASE_SYSTEM_PROMPT.to_string()
        } else {
            format!(
                "{}\n\n{}\n\nContext:\n{}",
                BASE_SYSTEM_PROMPT, CONTEXT_INSTRUCTIONS, context
            )
        };

        Prompt {
            system,
            user: query_text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::document::Metadata;

    fn hit(text: &str, score: f32) -> RetrievedDocument {
        RetrievedDocument {
            id: text.to_string(),
            text: text.to_string(),
            metadata: Metadata::new(),
            score,
        }
    }

    #[test]
    fn empty_retrieval_gives_empty_context_and_base_prompt() {
        let context = ContextAssembler::assemble(&[]);
        assert_eq!(context, "");

        let prompt = ContextAssembler::build_prompt(&context, "hello");
        assert_eq!(prompt.system, BASE_SYSTEM_PROMPT);
        assert_eq!(prompt.user, "hello");
    }

    #[test]
    fn single_document_is_included_verbatim() {
        let context = ContextAssembler::assemble(&[hit("Paris is the capital of France.", 0.9)]);
        assert_eq!(context, "Paris is the capital of France.");
    }

    #[test]
    fn documents_keep_received_order_and_are_not_deduplicated() {
        let docs = [hit("second best", 0.5), hit("best", 0.9), hit("best", 0.9)];
        let context = ContextAssembler::assemble(&docs);
        assert_eq!(context, "second best\n\nbest\n\nbest");
    }

    #[test]
    fn low_scores_and_long_texts_are_not_filtered() {
        let long = "x".repeat(20_000);
        let context = ContextAssembler::assemble(&[hit(&long, -0.3)]);
        assert_eq!(context.len(), 20_000);
    }

    #[test]
    fn context_prompt_carries_instructions_and_literal_context() {
        let context = "Line one.\n\nLine two.";
        let prompt = ContextAssembler::build_prompt(context, "  What is it?  ");

        assert!(prompt.system.starts_with(BASE_SYSTEM_PROMPT));
        assert!(prompt.system.contains("don't know"));
        assert!(prompt.system.ends_with(context));
        assert_eq!(prompt.user, "  What is it?  ");
    }
}
