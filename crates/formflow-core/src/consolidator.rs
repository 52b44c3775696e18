//! Answer consolidation
//!
//! Merges the raw per-field answers into a structured [`AnswerSet`] via a
//! summarizing completion call. The model is asked for strict JSON with
//! exactly one answer per field; common wrapping artifacts are stripped
//! before parsing. A parse (or model) failure never fails the cycle: the
//! set is then built directly from the uncondensed answers, so any
//! non-empty input always yields an `AnswerSet`.

use crate::source::CompletionModel;
use crate::types::{Answer, AnswerSet};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ConsolidatedAnswers {
    answers: Vec<Answer>,
}

/// Consolidate per-field answers into an [`AnswerSet`].
///
/// Infallible for non-empty input: falls back to the raw answers when the
/// summarizing call cannot be used.
pub async fn consolidate<M>(answers: Vec<Answer>, model: &M) -> AnswerSet
where
    M: CompletionModel + ?Sized,
{
    if answers.is_empty() {
        return AnswerSet::from_answers(answers);
    }

    let prompt = consolidation_prompt(&answers);

    let raw = match model.complete(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "consolidation call failed, using raw answers");
            return AnswerSet::from_answers(answers);
        }
    };

    let cleaned = strip_wrapping(raw.trim());
    match serde_json::from_str::<ConsolidatedAnswers>(cleaned) {
        Ok(parsed) if !parsed.answers.is_empty() => {
            tracing::debug!(answers = parsed.answers.len(), "consolidation parsed");
            AnswerSet::from_answers(parsed.answers)
        }
        Ok(_) => {
            tracing::warn!("consolidation returned no answers, using raw answers");
            AnswerSet::from_answers(answers)
        }
        Err(e) => {
            tracing::warn!(error = %e, "consolidation output not parseable, using raw answers");
            AnswerSet::from_answers(answers)
        }
    }
}

/// Strip a `\boxed{...}` wrapper when present
pub(crate) fn strip_wrapping(text: &str) -> &str {
    if let Some(start) = text.find("\\boxed{") {
        let inner_start = start + "\\boxed{".len();
        if let Some(end) = text.rfind('}') {
            if end > inner_start {
                return &text[inner_start..end];
            }
        }
    }
    text
}

fn consolidation_prompt(answers: &[Answer]) -> String {
    let listing = answers
        .iter()
        .map(|a| {
            format!(
                "Field ID: {}\nQuestion: {}\nAnswer: {}\n---",
                a.entry_id, a.question, a.answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an expert at reviewing application answers. Review the \
         question/answer pairs below and provide one clear, concise, truthful \
         final answer per question.\n\
         Guidelines:\n\
         - For selection questions, keep only the most relevant option\n\
         - If a question cannot be answered from the profile, mark it as \
         \"information not found\"\n\
         <answers>\n{listing}\n</answers>\n\n\
         Return strictly the following JSON, with double-quoted property names \
         and string values:\n\
         {{\n\
             \"answers\": [\n\
                 {{\n\
                     \"entry_id\": \"field id\",\n\
                     \"question\": \"question text\",\n\
                     \"answer\": \"your final answer\"\n\
                 }}\n\
             ]\n\
         }}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use async_trait::async_trait;

    struct Returns(String);

    #[async_trait]
    impl CompletionModel for Returns {
        async fn complete(&self, _prompt: &str) -> Result<String, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    #[async_trait]
    impl CompletionModel for Broken {
        async fn complete(&self, _prompt: &str) -> Result<String, SourceError> {
            Err(SourceError::new("model offline"))
        }
    }

    fn raw_answers() -> Vec<Answer> {
        vec![
            Answer {
                entry_id: "entry.1".to_string(),
                question: "Full Name".to_string(),
                answer: "Ada Lovelace, mathematician".to_string(),
            },
            Answer {
                entry_id: "entry.2".to_string(),
                question: "Stack".to_string(),
                answer: "Mostly Rust, also some Go".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn parses_structured_output() {
        let model = Returns(
            r#"{"answers":[
                {"entry_id":"entry.1","question":"Full Name","answer":"Ada Lovelace"},
                {"entry_id":"entry.2","question":"Stack","answer":"Rust"}
            ]}"#
            .to_string(),
        );
        let set = consolidate(raw_answers(), &model).await;

        assert_eq!(set.display[0].answer, "Ada Lovelace");
        assert_eq!(set.submission["entry.2"], "Rust");
    }

    #[tokio::test]
    async fn strips_boxed_wrapper() {
        let model = Returns(
            r#"\boxed{{"answers":[{"entry_id":"entry.1","question":"Full Name","answer":"Ada"},{"entry_id":"entry.2","question":"Stack","answer":"Rust"}]}}"#
                .to_string(),
        );
        let set = consolidate(raw_answers(), &model).await;
        assert_eq!(set.submission["entry.1"], "Ada");
    }

    #[tokio::test]
    async fn unparseable_output_falls_back_to_raw_in_order() {
        let model = Returns("I could not produce JSON, sorry".to_string());
        let set = consolidate(raw_answers(), &model).await;

        assert_eq!(set.len(), 2);
        assert_eq!(set.display[0].entry_id, "entry.1");
        assert_eq!(set.display[1].entry_id, "entry.2");
        assert_eq!(set.submission["entry.1"], "Ada Lovelace, mathematician");
    }

    #[tokio::test]
    async fn model_failure_falls_back_to_raw() {
        let set = consolidate(raw_answers(), &Broken).await;
        assert_eq!(set.len(), 2);
    }

    #[tokio::test]
    async fn empty_parsed_list_falls_back_to_raw() {
        let model = Returns(r#"{"answers":[]}"#.to_string());
        let set = consolidate(raw_answers(), &model).await;
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn strip_wrapping_variants() {
        assert_eq!(strip_wrapping(r"\boxed{inner}"), "inner");
        assert_eq!(strip_wrapping("plain"), "plain");
        assert_eq!(strip_wrapping(r"prefix \boxed{a} suffix}"), "a} suffix");
    }
}
