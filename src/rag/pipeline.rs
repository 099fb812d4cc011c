//! Query answering: retrieve, render, derive, synthesize, suggest.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};
use crate::rag::context::format_context;
use crate::rag::generator::{TemplateGenerator, TextGenerator};
use crate::rag::rules::{structured_query, suggestions};
use crate::semantic::{DocumentIndex, ScoredDocument};

/// Number of documents retrieved when the caller does not say.
pub const DEFAULT_CONTEXT_LIMIT: usize = 5;

/// Response used whenever answering failed.
pub const DEGRADED_RESPONSE: &str = "I apologize, but I encountered an error processing your query. Please try rephrasing your question.";

/// Response used when only the generator failed.
pub const GENERATION_FALLBACK: &str =
    "I apologize, but I couldn't generate a proper response to your query. Please try again.";

/// Result of a query.
///
/// A degraded answer carries `error` and omits the retrieval fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub query: String,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_documents: Option<Vec<ScoredDocument>>,
    #[serde(rename = "sql_query", skip_serializing_if = "Option::is_none")]
    pub structured_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Answer {
    /// The fixed apology answer for `cause`.
    pub fn degraded(query: impl Into<String>, cause: &PipelineError) -> Self {
        Self {
            query: query.into(),
            response: DEGRADED_RESPONSE.to_string(),
            context_documents: None,
            structured_query: None,
            suggestions: None,
            error: Some(cause.to_string()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// Answers questions from the document index.
pub struct RetrievalPipeline {
    index: Arc<DocumentIndex>,
    generator: Arc<dyn TextGenerator>,
}

impl std::fmt::Debug for RetrievalPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalPipeline")
            .field("index", &self.index)
            .field("generator", &self.generator.name())
            .finish()
    }
}

impl RetrievalPipeline {
    /// Pipeline answering with [`TemplateGenerator`].
    pub fn new(index: Arc<DocumentIndex>) -> Self {
        Self::with_generator(index, Arc::new(TemplateGenerator))
    }

    pub fn with_generator(index: Arc<DocumentIndex>, generator: Arc<dyn TextGenerator>) -> Self {
        Self { index, generator }
    }

    pub fn index(&self) -> &Arc<DocumentIndex> {
        &self.index
    }

    /// Answers `query`, degrading any failure to [`Answer::degraded`].
    pub fn answer(&self, query: &str, context_limit: usize) -> Answer {
        self.try_answer(query, context_limit).unwrap_or_else(|e| {
            tracing::warn!(query, error = %e, code = %e.status_code(), "query degraded");
            Answer::degraded(query, &e)
        })
    }

    /// Runs every stage in order; only retrieval can fail.
    pub fn try_answer(&self, query: &str, context_limit: usize) -> PipelineResult<Answer> {
        let documents = self.index.try_search(query, context_limit)?;
        let context = format_context(&documents);
        let structured_query = structured_query(query);

        let response = self.generator.generate(query, &context).unwrap_or_else(|e| {
            tracing::warn!(
                generator = self.generator.name(),
                error = %e,
                "answer generation failed"
            );
            GENERATION_FALLBACK.to_string()
        });

        tracing::debug!(
            query,
            documents = documents.len(),
            structured_query,
            "answered query"
        );

        Ok(Answer {
            query: query.to_string(),
            response,
            context_documents: Some(documents),
            structured_query: Some(structured_query.to_string()),
            suggestions: Some(suggestions(query)),
            error: None,
        })
    }

    /// [`RetrievalPipeline::answer`] on the blocking pool, bounded by `timeout`.
    ///
    /// A timeout or a panicked task gives the degraded answer.
    pub async fn answer_with_timeout(
        self: Arc<Self>,
        query: String,
        context_limit: usize,
        timeout: Duration,
    ) -> Answer {
        match self
            .try_answer_with_timeout(query.clone(), context_limit, timeout)
            .await
        {
            Ok(answer) => answer,
            Err(cause) => {
                tracing::warn!(
                    query = %query,
                    error = %cause,
                    code = %cause.status_code(),
                    "query degraded"
                );
                Answer::degraded(query, &cause)
            }
        }
    }

    /// Like [`RetrievalPipeline::answer_with_timeout`] but reports a timeout
    /// or task failure to the caller.
    ///
    /// The blocking task is not cancelled on timeout and finishes in the
    /// background.
    pub async fn try_answer_with_timeout(
        self: Arc<Self>,
        query: String,
        context_limit: usize,
        timeout: Duration,
    ) -> PipelineResult<Answer> {
        let task = tokio::task::spawn_blocking(move || self.answer(&query, context_limit));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(answer)) => Ok(answer),
            Ok(Err(join_error)) => Err(PipelineError::Task(join_error.to_string())),
            Err(_) => Err(PipelineError::Timeout { timeout }),
        }
    }
}
