//! Analysis boundary: question answering over an ingested table.
//!
//! The pipeline composes retrieval, prompt construction, and a pluggable
//! [`TextGenerator`]. Script execution sits behind [`ScriptExecutor`], which
//! has no shipped implementation; callers supply a sandboxed one.

pub mod gemini;
pub mod prompt;

pub use gemini::GeminiGenerator;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::embeddings::Embedder;
use crate::error::Result;
use crate::index::VectorIndex;
use crate::search;
use crate::table::{ColumnClass, Table};

/// A text-completion service: prompt in, reply out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a reply. Failures surface as [`TabragError::Generation`],
    /// never as a panic.
    ///
    /// [`TabragError::Generation`]: crate::error::TabragError::Generation
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Result of running a generated analysis script against a table.
///
/// Any combination of outputs may be present; `error` set means the run
/// failed and the other fields describe whatever was produced before that.
#[derive(Debug, Default, Clone)]
pub struct ExecutionOutcome {
    pub text: Option<String>,
    pub table: Option<Table>,
    pub image: Option<Vec<u8>>,
    pub error: Option<String>,
}

/// Executes analysis scripts against a table. Implementations must contain
/// failures in [`ExecutionOutcome::error`] rather than panicking past this
/// boundary.
pub trait ScriptExecutor: Send + Sync {
    fn execute(&self, code: &str, table: &Table) -> ExecutionOutcome;
}

/// Answer a question about an ingested table.
///
/// Retrieves the closest row documents, builds the structured analysis
/// prompt, and hands it to the generator. Retrieval and generation errors
/// propagate; callers render them as an error message to the user.
#[allow(clippy::too_many_arguments)]
pub async fn answer_question(
    question: &str,
    table: &Table,
    classes: &HashMap<String, ColumnClass>,
    index: Option<&VectorIndex>,
    documents: &[String],
    member_name: &str,
    embedder: &dyn Embedder,
    generator: &dyn TextGenerator,
    top_k: usize,
    prior_conclusions: Option<&str>,
) -> Result<String> {
    let hits = search::retrieve_context(question, index, documents, embedder, top_k).await?;
    let context = search::context_block(&hits);
    let schema = prompt::schema_description(table, classes);
    let full_prompt = prompt::analysis_prompt(
        question,
        &schema,
        member_name,
        if context.is_empty() { None } else { Some(&context) },
        prior_conclusions,
    );
    log::debug!("analysis prompt is {} chars, {} retrieved rows", full_prompt.len(), hits.len());
    generator.generate(&full_prompt).await
}

/// Rewrite a question for clarity, fixing typos without changing meaning.
///
/// Generation failure falls back to the original question so clarification
/// never blocks the flow. The reply is cut to its first line.
pub async fn clarify_question(question: &str, generator: &dyn TextGenerator) -> String {
    match generator.generate(&prompt::clarify_prompt(question)).await {
        Ok(reply) => {
            let first_line = reply.trim().lines().next().unwrap_or("").trim().to_string();
            if first_line.is_empty() {
                question.to_string()
            } else {
                first_line
            }
        }
        Err(e) => {
            log::warn!("clarification failed, keeping original question: {}", e);
            question.to_string()
        }
    }
}
