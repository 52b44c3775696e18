//! Formflow Core - answer workflow engine
//!
//! Drives a decoded form schema through generated answers and a
//! human-in-the-loop approval loop:
//! - Compiles one natural-language query per field
//! - Fans queries out concurrently and fans answers back in behind a
//!   strict barrier
//! - Consolidates raw answers into a reviewable [`AnswerSet`]
//! - Suspends for human review and classifies the response as approve or
//!   revise
//! - Validates required fields and builds the wire-format submission
//!
//! # Example
//!
//! ```rust,ignore
//! use formflow_core::{Resumption, WorkflowConfig, WorkflowRun};
//!
//! # async fn example(
//! #     schema: formflow_schema::FormSchema,
//! #     source: &dyn formflow_core::AnswerSource,
//! #     model: &dyn formflow_core::CompletionModel,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let mut run = WorkflowRun::new(schema, WorkflowConfig::new())?;
//!
//! let review = run.advance(source, model).await?;
//! println!("please review {} answers", review.len());
//!
//! // ... arbitrarily later, with the human's response in hand ...
//! match run.resume("looks good to me", source, model).await? {
//!     Resumption::Approved(payload) => println!("{}", payload.to_json()),
//!     Resumption::Revised => println!("revised, review again"),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod compiler;
pub mod consolidator;
pub mod coordinator;
pub mod error;
pub mod source;
pub mod submission;
pub mod types;
pub mod workflow;

// Re-exports for convenience
pub use compiler::{compile, compile_all};
pub use consolidator::consolidate;
pub use coordinator::{gather_answers, FALLBACK_ANSWER, REQUIRED_MARKER};
pub use error::{SourceError, SubmissionError, WorkflowError};
pub use source::{AnswerSource, CompletionModel, RetrievalAnswerSource};
pub use submission::{build_payload, WirePayload};
pub use types::{Answer, AnswerSet, FeedbackVerdict, Query, WorkflowConfig};
pub use workflow::{allowed_transitions, classify_verdict, Resumption, RunState, WorkflowRun};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a workflow run
    pub use crate::{
        AnswerSet, AnswerSource, CompletionModel, Resumption, RunState, WorkflowConfig,
        WorkflowError, WorkflowRun,
    };
    pub use formflow_schema::{FormClient, FormSchema};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
