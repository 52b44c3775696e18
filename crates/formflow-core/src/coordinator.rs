//! Fan-out/fan-in answer coordination
//!
//! Dispatches one answer-source call per compilable field, concurrently,
//! and blocks until exactly N answers have arrived. The join is a strict
//! barrier: partial result sets never reach consolidation, and display
//! order always follows schema field order regardless of completion
//! order.
//!
//! A failed per-field call does not abort the batch; a standardized
//! fallback answer is substituted so the barrier still completes. Only
//! when every dispatched call fails is the source treated as unreachable
//! and the cycle aborted.

use crate::compiler::compile_all;
use crate::error::WorkflowError;
use crate::source::AnswerSource;
use crate::types::{Answer, Query};
use formflow_schema::FormSchema;
use futures::future::join_all;

/// Fallback answer substituted when a per-field call fails
pub const FALLBACK_ANSWER: &str =
    "Unable to determine an answer; flagged for manual input.";

/// Marker appended to the fallback for required fields
pub const REQUIRED_MARKER: &str = " (This is a required field.)";

/// Gather one answer per compilable field.
///
/// # Errors
/// [`WorkflowError::AnswerSourceUnavailable`] when every dispatched call
/// failed, indicating the source is entirely unreachable.
pub async fn gather_answers<S>(
    schema: &FormSchema,
    feedback: Option<&str>,
    source: &S,
) -> Result<Vec<Answer>, WorkflowError>
where
    S: AnswerSource + ?Sized,
{
    let queries = compile_all(schema, feedback);
    if queries.is_empty() {
        return Ok(Vec::new());
    }

    let expected = queries.len();
    tracing::debug!(fields = expected, "dispatching answer queries");

    // join_all is the barrier: it yields exactly one result per query,
    // in query (= schema) order.
    let results = join_all(queries.iter().map(|q| answer_one(q, source))).await;
    debug_assert_eq!(results.len(), expected);

    let failures = results.iter().filter(|(_, failed)| *failed).count();
    if failures == expected {
        tracing::error!(fields = expected, "every answer call failed");
        return Err(WorkflowError::AnswerSourceUnavailable {
            reason: format!("all {expected} answer calls failed"),
        });
    }
    if failures > 0 {
        tracing::warn!(failures, fields = expected, "substituted fallback answers");
    }

    Ok(results.into_iter().map(|(answer, _)| answer).collect())
}

/// Answer one query, substituting the fallback text on failure.
///
/// Returns the answer and whether the underlying call failed.
async fn answer_one<S>(query: &Query, source: &S) -> (Answer, bool)
where
    S: AnswerSource + ?Sized,
{
    let prompt = wrap_query(query);

    match source.ask(&prompt).await {
        Ok(text) => (
            Answer {
                entry_id: query.field_id.clone(),
                question: query.question.clone(),
                answer: text,
            },
            false,
        ),
        Err(e) => {
            tracing::warn!(field = query.field_id.as_str(), error = %e, "answer call failed");
            let mut answer = FALLBACK_ANSWER.to_string();
            if query.required {
                answer.push_str(REQUIRED_MARKER);
            }
            (
                Answer {
                    entry_id: query.field_id.clone(),
                    question: query.question.clone(),
                    answer,
                },
                true,
            )
        }
    }
}

/// Wrap a compiled query with the answering guidelines
fn wrap_query(query: &Query) -> String {
    format!(
        "Analyze the following question about the candidate profile and provide \
         a detailed, truthful answer. Draw on specific details and keep a \
         professional tone.\n\n\
         {}\n\n\
         Guidelines:\n\
         1. Use specific details from the profile wherever they exist\n\
         2. If the profile does not contain the information, state that \
         explicitly\n\
         3. For selection questions, justify the choice from the profile",
        query.text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use async_trait::async_trait;
    use formflow_schema::{FieldDescriptor, FieldId, FieldType};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Barrier;

    fn schema(n: u64) -> FormSchema {
        FormSchema {
            fields: (1..=n)
                .map(|i| {
                    FieldDescriptor::new(FieldId::Numeric(i), format!("Q{i}"), FieldType::ShortText)
                        .required(i == 1)
                })
                .collect(),
            page_count: 0,
            collects_email: false,
        }
    }

    struct Echo;

    #[async_trait]
    impl AnswerSource for Echo {
        async fn ask(&self, query: &str) -> Result<String, SourceError> {
            // Answer with the question id embedded in the query
            let id = query
                .lines()
                .find_map(|l| l.strip_prefix("Question ID: "))
                .unwrap_or("?");
            Ok(format!("answer for {id}"))
        }
    }

    /// Fails for one specific field id, succeeds otherwise
    struct FailOne(&'static str);

    #[async_trait]
    impl AnswerSource for FailOne {
        async fn ask(&self, query: &str) -> Result<String, SourceError> {
            if query.contains(self.0) {
                Err(SourceError::new("backend hiccup"))
            } else {
                Ok("ok".to_string())
            }
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl AnswerSource for AlwaysFails {
        async fn ask(&self, _query: &str) -> Result<String, SourceError> {
            Err(SourceError::new("index offline"))
        }
    }

    /// Blocks until all expected calls have started, proving fan-out
    /// actually runs concurrently; counts completions.
    struct Rendezvous {
        barrier: Barrier,
        completed: AtomicUsize,
    }

    #[async_trait]
    impl AnswerSource for Rendezvous {
        async fn ask(&self, _query: &str) -> Result<String, SourceError> {
            self.barrier.wait().await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok("ok".to_string())
        }
    }

    #[tokio::test]
    async fn gathers_exactly_n_answers_in_schema_order() {
        let schema = schema(4);
        let answers = gather_answers(&schema, None, &Echo).await.unwrap();

        assert_eq!(answers.len(), 4);
        let ids: Vec<_> = answers.iter().map(|a| a.entry_id.as_str()).collect();
        assert_eq!(ids, vec!["entry.1", "entry.2", "entry.3", "entry.4"]);
        assert_eq!(answers[2].answer, "answer for entry.3");
    }

    #[tokio::test]
    async fn calls_run_concurrently() {
        let schema = schema(3);
        let source = Rendezvous {
            barrier: Barrier::new(3),
            completed: AtomicUsize::new(0),
        };

        // Would deadlock if the three calls ran sequentially.
        let answers = gather_answers(&schema, None, &source).await.unwrap();
        assert_eq!(answers.len(), 3);
        assert_eq!(source.completed.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn per_field_failure_substitutes_fallback() {
        let schema = schema(3);
        let answers = gather_answers(&schema, None, &FailOne("entry.1"))
            .await
            .unwrap();

        assert_eq!(answers.len(), 3);
        assert!(answers[0].answer.starts_with(FALLBACK_ANSWER));
        // Field 1 is required in the fixture
        assert!(answers[0].answer.contains("required field"));
        assert_eq!(answers[1].answer, "ok");
    }

    #[tokio::test]
    async fn all_failures_surface_as_unavailable() {
        let schema = schema(2);
        let err = gather_answers(&schema, None, &AlwaysFails).await.unwrap_err();
        assert!(matches!(err, WorkflowError::AnswerSourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn feedback_reaches_every_query() {
        struct Capture(std::sync::Mutex<Vec<String>>);

        #[async_trait]
        impl AnswerSource for Capture {
            async fn ask(&self, query: &str) -> Result<String, SourceError> {
                self.0.lock().unwrap().push(query.to_string());
                Ok("ok".to_string())
            }
        }

        let schema = schema(3);
        let source = Capture(std::sync::Mutex::new(Vec::new()));
        gather_answers(&schema, Some("the phone number is wrong"), &source)
            .await
            .unwrap();

        let seen = source.0.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|q| q.contains("the phone number is wrong")));
    }
}
