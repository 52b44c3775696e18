//! Core types for the answer workflow engine
//!
//! Defines the values flowing through a run:
//! - Compiled per-field queries
//! - Raw and consolidated answers
//! - The approve/revise verdict
//! - Run configuration

use formflow_schema::Selection;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A compiled natural-language query for one field.
///
/// Ephemeral: created per compiler invocation and consumed by the
/// coordinator within the same cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Wire key of the field this query answers
    pub field_id: String,
    /// Question text shown to the answer source
    pub question: String,
    /// Full query text, including instructions and any feedback block
    pub text: String,
    /// Selection refinement hint, when the field is choice-bearing
    pub type_hint: Option<Selection>,
    /// Whether the field is required
    pub required: bool,
}

/// A single per-field answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Wire key of the answered field
    pub entry_id: String,
    /// Question text, for human review
    pub question: String,
    /// Answer text
    pub answer: String,
}

/// Consolidated answers for one cycle.
///
/// Replaced wholesale on each revise cycle, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet {
    /// Ordered answers for human review, in schema field order
    pub display: Vec<Answer>,
    /// Submission mapping, wire key to answer text, keys unique
    pub submission: IndexMap<String, String>,
}

impl AnswerSet {
    /// Build an answer set directly from per-field answers.
    ///
    /// Preserves answer order in `display`; later duplicates of a wire key
    /// overwrite earlier ones in `submission`.
    #[must_use]
    pub fn from_answers(answers: Vec<Answer>) -> Self {
        let submission = answers
            .iter()
            .map(|a| (a.entry_id.clone(), a.answer.clone()))
            .collect();
        Self {
            display: answers,
            submission,
        }
    }

    /// Number of answers in the display list
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.display.len()
    }

    /// Whether the set holds no answers
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display.is_empty()
    }
}

/// Binary classification of a human review response.
///
/// Derived transiently from the classifier call; never persisted beyond
/// the state transition it drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackVerdict {
    /// The answers are accepted; proceed to submission
    Approve,
    /// The answers need another cycle with the response as feedback
    Revise,
}

/// Workflow run configuration
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Budget for the whole remainder of a run, including time spent
    /// suspended awaiting review
    pub run_timeout: Duration,
    /// Maximum compilable fields per run
    pub max_fields: usize,
}

impl WorkflowConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With run timeout budget
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// With per-run field limit
    #[inline]
    #[must_use]
    pub fn with_max_fields(mut self, max: usize) -> Self {
        self.max_fields = max;
        self
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            run_timeout: Duration::from_secs(1000),
            max_fields: 20,
        }
    }
}
