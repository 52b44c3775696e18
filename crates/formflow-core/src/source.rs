//! Answer source and completion model seams
//!
//! The workflow engine consumes two external collaborators:
//! - An [`AnswerSource`] that answers free-text queries from a knowledge
//!   base (typically retrieval-augmented)
//! - A [`CompletionModel`] that runs plain completion prompts, used for
//!   consolidation and verdict classification
//!
//! Both are object-safe async traits so callers can wire any backend.

use crate::error::SourceError;
use async_trait::async_trait;

/// A knowledge-backed answer source
#[async_trait]
pub trait AnswerSource: Send + Sync {
    /// Answer a free-text query.
    ///
    /// # Errors
    /// Returns an opaque [`SourceError`] on backend unavailability.
    async fn ask(&self, query: &str) -> Result<String, SourceError>;
}

/// A plain completion backend
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Complete a prompt and return the raw text output.
    ///
    /// # Errors
    /// Returns an opaque [`SourceError`] on backend unavailability.
    async fn complete(&self, prompt: &str) -> Result<String, SourceError>;
}

/// Answer source that prefers retrieval and falls back to plain completion.
///
/// The engine treats a structured retrieval-augmented answer and a plain
/// completion as interchangeable; this adapter encodes the preference
/// order. Only when both backends fail does the query fail.
pub struct RetrievalAnswerSource<R, M> {
    retrieval: R,
    model: M,
}

impl<R, M> RetrievalAnswerSource<R, M>
where
    R: AnswerSource,
    M: CompletionModel,
{
    /// Wrap a retrieval backend with a completion fallback
    #[inline]
    pub fn new(retrieval: R, model: M) -> Self {
        Self { retrieval, model }
    }
}

#[async_trait]
impl<R, M> AnswerSource for RetrievalAnswerSource<R, M>
where
    R: AnswerSource,
    M: CompletionModel,
{
    async fn ask(&self, query: &str) -> Result<String, SourceError> {
        match self.retrieval.ask(query).await {
            Ok(text) if !text.trim().is_empty() => Ok(text),
            Ok(_) => {
                tracing::debug!("retrieval returned empty answer, falling back to completion");
                self.model.complete(query).await
            }
            Err(e) => {
                tracing::warn!(error = %e, "retrieval failed, falling back to completion");
                self.model.complete(query).await
            }
        }
    }
}
