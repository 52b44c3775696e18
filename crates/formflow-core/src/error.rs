//! Error types for the answer workflow engine
//!
//! Taxonomy per component:
//! - Schema decode failures propagate from `formflow-schema`
//! - Answer-source unreachability aborts the current answering cycle
//! - Submission validation reports every missing required field at once
//! - Run-level timeout and illegal state transitions are terminal
//!
//! Consolidation parse failures are recovered locally via fallback and
//! never appear here.

use crate::workflow::RunState;
use formflow_schema::SchemaError;

/// Opaque answer-source / completion-backend failure
#[derive(Debug, thiserror::Error)]
#[error("answer backend failed: {0}")]
pub struct SourceError(pub String);

impl SourceError {
    /// Wrap a backend failure message
    #[inline]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Workflow run errors
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Schema decoding or transport failed
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The answer source was entirely unreachable for this cycle
    #[error("answer source unavailable: {reason}")]
    AnswerSourceUnavailable {
        /// Human-readable reason
        reason: String,
    },

    /// The run exceeded its time budget
    #[error("run timed out after {budget_secs}s")]
    RunTimeout {
        /// Configured budget in seconds
        budget_secs: u64,
    },

    /// The schema carries more compilable fields than a run permits
    #[error("schema has {count} compilable fields, limit is {limit}")]
    FieldLimitExceeded {
        /// Compilable field count
        count: usize,
        /// Configured limit
        limit: usize,
    },

    /// An operation was invoked in a state that does not permit it
    #[error("illegal transition: {from:?} -> {to:?}")]
    InvalidState {
        /// State the run was in
        from: RunState,
        /// State the operation required entering
        to: RunState,
    },

    /// Submission validation or transport failed
    #[error("submission error: {0}")]
    Submission(#[from] SubmissionError),
}

/// Submission building errors
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// One or more required fields are absent or empty.
    ///
    /// Exhaustive: names every offending question, not just the first.
    #[error("missing required fields: {}", questions.join("; "))]
    MissingRequiredFields {
        /// Question texts of every missing required field
        questions: Vec<String>,
    },

    /// The submission endpoint rejected the payload
    #[error("submission rejected with status {status}")]
    Http {
        /// HTTP status code of the rejection
        status: u16,
    },

    /// Transport failure below the HTTP layer
    #[error("schema transport error: {0}")]
    Transport(#[from] SchemaError),
}
