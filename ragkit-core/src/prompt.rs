//! Prompt template loading and assembly.

use std::path::Path;

use crate::document::SearchResult;
use crate::error::{RagError, Result};

/// The placeholder token substituted with retrieved context.
pub const CONTEXT_PLACEHOLDER: &str = "{{question_answer_context}}";

/// The delimiter between retained candidates' texts in a prompt context.
const CONTEXT_DELIMITER: &str = "\n\n";

/// Build a prompt context from retained search results.
///
/// Joins the candidates' texts with a blank line, in the order given
/// (post-rerank order). Empty input yields an empty context.
pub fn build_context(results: &[SearchResult]) -> String {
    results.iter().map(|r| r.chunk.text.as_str()).collect::<Vec<_>>().join(CONTEXT_DELIMITER)
}

/// A prompt skeleton with a context placeholder.
///
/// Loaded once at startup and reused for every query. The template should
/// contain [`CONTEXT_PLACEHOLDER`] exactly once; a template without the
/// placeholder is degraded but valid — it is kept as a literal prefix and
/// the context is appended instead.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_core::PromptTemplate;
///
/// let template = PromptTemplate::new(
///     "Answer using only this context:\n{{question_answer_context}}",
/// );
/// let prompt = template.assemble("retrieved passage", "what is RAG?");
/// ```
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Create a template from a string.
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }

    /// Load a template from a UTF-8 text file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let template = std::fs::read_to_string(path).map_err(|e| {
            RagError::Config(format!("failed to load prompt template '{}': {e}", path.display()))
        })?;
        Ok(Self::new(template))
    }

    /// Return the raw template text.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute the context placeholder with `context`.
    ///
    /// Performs a single literal substitution. If the placeholder is
    /// absent, the template becomes a literal prefix with the context
    /// appended after a blank line — never an error.
    pub fn render(&self, context: &str) -> String {
        if self.template.contains(CONTEXT_PLACEHOLDER) {
            self.template.replacen(CONTEXT_PLACEHOLDER, context, 1)
        } else {
            format!("{}{CONTEXT_DELIMITER}{context}", self.template)
        }
    }

    /// Merge the template, the context, and the user query into the final
    /// prompt.
    pub fn assemble(&self, context: &str, query: &str) -> String {
        format!("{}{CONTEXT_DELIMITER}{query}", self.render(context))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::document::Chunk;

    fn result(text: &str) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                id: "c".to_string(),
                text: text.to_string(),
                embedding: Vec::new(),
                metadata: HashMap::new(),
                document_id: "doc".to_string(),
            },
            score: 1.0,
        }
    }

    #[test]
    fn render_substitutes_placeholder_once() {
        let template = PromptTemplate::new("Context:\n{{question_answer_context}}\nAnswer:");
        let rendered = template.render("the facts");
        assert_eq!(rendered, "Context:\nthe facts\nAnswer:");
        assert!(!rendered.contains(CONTEXT_PLACEHOLDER));
    }

    #[test]
    fn render_without_placeholder_appends_context() {
        let template = PromptTemplate::new("Answer from the handbook.");
        let rendered = template.render("the facts");
        assert_eq!(rendered, "Answer from the handbook.\n\nthe facts");
    }

    #[test]
    fn assemble_appends_user_query() {
        let template = PromptTemplate::new("Use: {{question_answer_context}}");
        let prompt = template.assemble("ctx", "what year is it?");
        assert_eq!(prompt, "Use: ctx\n\nwhat year is it?");
    }

    #[test]
    fn build_context_joins_in_order_with_blank_lines() {
        let results = [result("first"), result("second"), result("third")];
        assert_eq!(build_context(&results), "first\n\nsecond\n\nthird");
        assert_eq!(build_context(&[]), "");
    }
}
