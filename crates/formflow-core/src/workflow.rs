//! Feedback loop controller
//!
//! The state machine owning a run:
//!
//! ```text
//! Answering -> Reviewing -> { Revising -> Answering, Approved, Failed }
//! ```
//!
//! `Answering` runs compiler, coordinator and consolidator to produce a
//! fresh [`AnswerSet`]. `Reviewing` is the system's sole suspension
//! point: the run is a plain value between [`WorkflowRun::advance`] and
//! [`WorkflowRun::resume`], so a caller can hold it arbitrarily long
//! (subject only to the run deadline, which keeps ticking while
//! suspended). Resumption classifies the human's free-text response into
//! an approve/revise verdict and either terminates with the validated
//! wire payload or re-enters answering with the response as feedback.

use crate::consolidator::{consolidate, strip_wrapping};
use crate::coordinator::gather_answers;
use crate::error::WorkflowError;
use crate::source::{AnswerSource, CompletionModel};
use crate::submission::{build_payload, WirePayload};
use crate::types::{AnswerSet, FeedbackVerdict, WorkflowConfig};
use formflow_schema::FormSchema;
use tokio::time::Instant;

/// States of a workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Producing a fresh answer set
    Answering,
    /// Suspended, awaiting a human review response
    Reviewing,
    /// A revise verdict was accepted; about to re-enter answering
    Revising,
    /// Terminal: answers approved and validated
    Approved,
    /// Terminal: unrecoverable error or timeout
    Failed,
}

impl RunState {
    /// Whether this state is terminal
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Failed)
    }
}

/// Legal transitions out of a state.
///
/// `Failed` is reachable from every non-terminal state; the terminal
/// states permit nothing.
#[must_use]
pub fn allowed_transitions(from: RunState) -> Vec<RunState> {
    use RunState::*;
    match from {
        Answering => vec![Reviewing, Failed],
        Reviewing => vec![Revising, Approved, Failed],
        Revising => vec![Answering, Failed],
        Approved | Failed => vec![],
    }
}

fn allowed(from: RunState, to: RunState) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}

/// Outcome of resuming a suspended run
#[derive(Debug)]
pub enum Resumption {
    /// The answers were approved and validated; the run is terminal and
    /// this payload is ready for submission
    Approved(WirePayload),
    /// The response was classified as feedback; a new answer set was
    /// produced and the run is suspended in `Reviewing` again. Read it
    /// via [`WorkflowRun::answer_set`].
    Revised,
}

/// A single workflow run.
///
/// Exclusively owned by one caller; `advance` and `resume` take
/// `&mut self`, so concurrent resumption cannot compile.
#[derive(Debug)]
pub struct WorkflowRun {
    schema: FormSchema,
    config: WorkflowConfig,
    state: RunState,
    answer_set: Option<AnswerSet>,
    feedback: Option<String>,
    cycle: u32,
    deadline: Instant,
}

impl WorkflowRun {
    /// Create a run over a decoded schema.
    ///
    /// Arms the run deadline and enforces the per-run field limit.
    ///
    /// # Errors
    /// [`WorkflowError::FieldLimitExceeded`] when the schema carries more
    /// compilable fields than the configuration permits.
    pub fn new(schema: FormSchema, config: WorkflowConfig) -> Result<Self, WorkflowError> {
        let count = schema.compilable_fields().count();
        if count > config.max_fields {
            return Err(WorkflowError::FieldLimitExceeded {
                count,
                limit: config.max_fields,
            });
        }

        let deadline = Instant::now() + config.run_timeout;
        Ok(Self {
            schema,
            config,
            state: RunState::Answering,
            answer_set: None,
            feedback: None,
            cycle: 0,
            deadline,
        })
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Completed revise cycles (0 on the first pass)
    #[inline]
    #[must_use]
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    /// The current answer set, once one has been produced
    #[inline]
    #[must_use]
    pub fn answer_set(&self) -> Option<&AnswerSet> {
        self.answer_set.as_ref()
    }

    /// The schema this run fills
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// Run the first answering cycle and suspend in `Reviewing`.
    ///
    /// Returns the answer set for human review.
    ///
    /// # Errors
    /// Any unrecoverable compiler/coordinator error moves the run to
    /// `Failed` with the originating error.
    pub async fn advance<S, M>(
        &mut self,
        source: &S,
        model: &M,
    ) -> Result<&AnswerSet, WorkflowError>
    where
        S: AnswerSource + ?Sized,
        M: CompletionModel + ?Sized,
    {
        if self.state != RunState::Answering {
            return Err(WorkflowError::InvalidState {
                from: self.state,
                to: RunState::Reviewing,
            });
        }

        self.answering_cycle(source, model).await?;
        self.current_set()
    }

    /// Resume a run suspended in `Reviewing` with a human response.
    ///
    /// The response is classified as approve or revise. Approval
    /// validates the required fields and terminates the run; a revise
    /// verdict re-enters answering with the response attached as
    /// feedback to every query of the next cycle.
    ///
    /// # Errors
    /// - [`WorkflowError::InvalidState`] when the run is not suspended
    /// - [`WorkflowError::RunTimeout`] when the budget is exhausted,
    ///   including time spent suspended
    /// - [`WorkflowError::Submission`] when approval fails validation;
    ///   the run moves to `Failed`
    pub async fn resume<S, M>(
        &mut self,
        human_response: &str,
        source: &S,
        model: &M,
    ) -> Result<Resumption, WorkflowError>
    where
        S: AnswerSource + ?Sized,
        M: CompletionModel + ?Sized,
    {
        if self.state != RunState::Reviewing {
            return Err(WorkflowError::InvalidState {
                from: self.state,
                to: RunState::Revising,
            });
        }
        self.check_deadline()?;

        let verdict = classify_verdict(human_response, model).await;
        tracing::info!(?verdict, cycle = self.cycle, "review response classified");

        match verdict {
            FeedbackVerdict::Approve => {
                let set = self.current_set()?;
                let payload = match build_payload(&self.schema, &set.submission) {
                    Ok(payload) => payload,
                    Err(e) => {
                        self.fail("submission validation failed");
                        return Err(e.into());
                    }
                };
                self.transition(RunState::Approved)?;
                Ok(Resumption::Approved(payload))
            }
            FeedbackVerdict::Revise => {
                self.transition(RunState::Revising)?;
                self.feedback = Some(human_response.to_string());
                self.cycle += 1;
                self.transition(RunState::Answering)?;
                self.answering_cycle(source, model).await?;
                Ok(Resumption::Revised)
            }
        }
    }

    /// One answering cycle: gather, consolidate, suspend in `Reviewing`.
    async fn answering_cycle<S, M>(&mut self, source: &S, model: &M) -> Result<(), WorkflowError>
    where
        S: AnswerSource + ?Sized,
        M: CompletionModel + ?Sized,
    {
        self.check_deadline()?;

        // Feedback applies to exactly one cycle.
        let feedback = self.feedback.take();
        tracing::info!(
            cycle = self.cycle,
            with_feedback = feedback.is_some(),
            "starting answering cycle"
        );

        let answers = match gather_answers(&self.schema, feedback.as_deref(), source).await {
            Ok(answers) => answers,
            Err(e) => {
                self.fail("answer gathering failed");
                return Err(e);
            }
        };

        let set = consolidate(answers, model).await;
        self.answer_set = Some(set);
        self.transition(RunState::Reviewing)
    }

    fn transition(&mut self, to: RunState) -> Result<(), WorkflowError> {
        if !allowed(self.state, to) {
            return Err(WorkflowError::InvalidState {
                from: self.state,
                to,
            });
        }
        tracing::debug!(from = ?self.state, ?to, "state transition");
        self.state = to;
        Ok(())
    }

    fn fail(&mut self, reason: &str) {
        tracing::error!(reason, from = ?self.state, "run failed");
        self.state = RunState::Failed;
    }

    /// The run deadline covers the whole remainder of the run, including
    /// time spent suspended in `Reviewing`.
    fn check_deadline(&mut self) -> Result<(), WorkflowError> {
        if Instant::now() >= self.deadline {
            self.fail("run budget exhausted");
            return Err(WorkflowError::RunTimeout {
                budget_secs: self.config.run_timeout.as_secs(),
            });
        }
        Ok(())
    }

    /// The stored answer set; an answering cycle always stores one before
    /// suspending, so absence means the run is not in a reviewable state.
    fn current_set(&self) -> Result<&AnswerSet, WorkflowError> {
        self.answer_set.as_ref().ok_or(WorkflowError::InvalidState {
            from: self.state,
            to: RunState::Reviewing,
        })
    }
}

/// Classify a human review response as approve or revise.
///
/// The classifier is asked to answer with a single token, biased toward
/// revision whenever the signal is ambiguous; a classification failure is
/// treated conservatively as revise and never silently approves.
pub async fn classify_verdict<M>(response: &str, model: &M) -> FeedbackVerdict
where
    M: CompletionModel + ?Sized,
{
    let prompt = format!(
        "You have received human feedback on a set of answers. Analyze the \
         feedback and decide whether changes are needed.\n\
         <feedback>\n{response}\n</feedback>\n\
         Rules:\n\
         1. If the feedback says everything is correct or no changes are \
         needed, reply only \"OKAY\"\n\
         2. If the feedback asks for changes or refinement, reply only \
         \"FEEDBACK\"\n\
         3. Be conservative: when in any doubt, reply \"FEEDBACK\"\n\
         Reply with exactly one word, either OKAY or FEEDBACK."
    );

    let raw = match model.complete(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "verdict classification failed, treating as revise");
            return FeedbackVerdict::Revise;
        }
    };

    let verdict = strip_wrapping(raw.trim()).trim().to_uppercase();
    if verdict.contains("OKAY") && !verdict.contains("FEEDBACK") {
        FeedbackVerdict::Approve
    } else {
        FeedbackVerdict::Revise
    }
}
