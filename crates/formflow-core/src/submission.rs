//! Submission building
//!
//! Cross-checks the approved answers against the schema's required
//! fields, re-keys every value with the entry-id formatting rule, injects
//! synthetic defaults, and performs the final HTTP submit through the
//! schema transport.

use crate::error::SubmissionError;
use formflow_schema::{FormClient, FormSchema, SchemaError};
use indexmap::IndexMap;

/// The wire-format submission payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WirePayload {
    entries: Vec<(String, String)>,
}

impl WirePayload {
    /// Ordered wire key/value pairs
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Number of entries in the payload
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the payload is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pretty-printed JSON rendering of the payload, for preview output
    #[must_use]
    pub fn to_json(&self) -> String {
        let map: IndexMap<&str, &str> = self
            .entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        serde_json::to_string_pretty(&map).unwrap_or_else(|_| "{}".to_string())
    }

    /// Submit the payload to the endpoint derived from the viewer URL.
    ///
    /// # Errors
    /// [`SubmissionError::Http`] with the status code on a non-200
    /// response; the caller decides whether to retry.
    pub async fn submit(
        &self,
        client: &FormClient,
        viewer_url: &str,
    ) -> Result<(), SubmissionError> {
        match client.submit(viewer_url, &self.entries).await {
            Ok(()) => Ok(()),
            Err(SchemaError::SubmitFailed { status }) => Err(SubmissionError::Http { status }),
            Err(e) => Err(SubmissionError::Transport(e)),
        }
    }
}

/// Build the wire payload from the schema and an approved submission map.
///
/// The map is keyed by wire key; bare numeric ids are accepted and
/// re-keyed. Fields carrying a fixed default value are injected directly,
/// bypassing the map.
///
/// # Errors
/// [`SubmissionError::MissingRequiredFields`] naming every required field
/// that is absent from, or empty in, the map.
pub fn build_payload(
    schema: &FormSchema,
    submission: &IndexMap<String, String>,
) -> Result<WirePayload, SubmissionError> {
    let mut missing = Vec::new();
    let mut entries = Vec::new();

    for field in &schema.fields {
        let key = field.id.entry_key();

        if let Some(default) = &field.default_value {
            entries.push((key, default.clone()));
            continue;
        }

        // Accept either the wire key or the bare provider id.
        let value = submission
            .get(&key)
            .or_else(|| submission.get(&field.id.to_string()));

        match value {
            Some(v) if !v.trim().is_empty() => entries.push((key, v.clone())),
            _ if field.required => missing.push(field.question_text()),
            _ => {}
        }
    }

    if !missing.is_empty() {
        tracing::warn!(missing = missing.len(), "submission is missing required fields");
        return Err(SubmissionError::MissingRequiredFields { questions: missing });
    }

    tracing::debug!(entries = entries.len(), "built wire payload");
    Ok(WirePayload { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use formflow_schema::{FieldDescriptor, FieldId, FieldType};

    fn schema() -> FormSchema {
        FormSchema {
            fields: vec![
                FieldDescriptor::new(FieldId::Numeric(1), "Full Name", FieldType::ShortText)
                    .required(true),
                FieldDescriptor::new(FieldId::Numeric(2), "Phone", FieldType::ShortText)
                    .required(true),
                FieldDescriptor::new(FieldId::Numeric(3), "Stack", FieldType::Dropdown),
                FieldDescriptor::new(
                    FieldId::Reserved(FieldId::PAGE_HISTORY.to_string()),
                    "Page History",
                    FieldType::Other,
                )
                .required(true)
                .with_default("0,1"),
            ],
            page_count: 1,
            collects_email: false,
        }
    }

    fn map(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn builds_payload_with_injected_default() {
        let submission = map(&[
            ("entry.1", "Ada Lovelace"),
            ("entry.2", "+44 20 1234"),
            ("entry.3", "Rust"),
        ]);
        let payload = build_payload(&schema(), &submission).unwrap();

        assert_eq!(payload.len(), 4);
        assert!(payload
            .entries()
            .contains(&("pageHistory".to_string(), "0,1".to_string())));
    }

    #[test]
    fn missing_required_field_is_named() {
        let submission = map(&[("entry.1", "Ada Lovelace")]);
        let err = build_payload(&schema(), &submission).unwrap_err();

        match err {
            SubmissionError::MissingRequiredFields { questions } => {
                assert_eq!(questions, vec!["Phone".to_string()]);
            }
            other => panic!("expected MissingRequiredFields, got {other:?}"),
        }
    }

    #[test]
    fn reports_every_missing_required_field() {
        let submission = map(&[("entry.3", "Rust")]);
        let err = build_payload(&schema(), &submission).unwrap_err();

        match err {
            SubmissionError::MissingRequiredFields { questions } => {
                assert_eq!(
                    questions,
                    vec!["Full Name".to_string(), "Phone".to_string()]
                );
            }
            other => panic!("expected MissingRequiredFields, got {other:?}"),
        }
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let submission = map(&[("entry.1", "Ada"), ("entry.2", "   ")]);
        let err = build_payload(&schema(), &submission).unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::MissingRequiredFields { .. }
        ));
    }

    #[test]
    fn bare_ids_are_rekeyed() {
        let submission = map(&[("1", "Ada"), ("2", "+44")]);
        let payload = build_payload(&schema(), &submission).unwrap();
        assert!(payload
            .entries()
            .contains(&("entry.1".to_string(), "Ada".to_string())));
    }

    #[test]
    fn optional_absent_field_is_skipped() {
        let submission = map(&[("entry.1", "Ada"), ("entry.2", "+44")]);
        let payload = build_payload(&schema(), &submission).unwrap();
        assert!(payload.entries().iter().all(|(k, _)| k != "entry.3"));
    }

    #[test]
    fn payload_renders_as_json() {
        let submission = map(&[("entry.1", "Ada"), ("entry.2", "+44")]);
        let payload = build_payload(&schema(), &submission).unwrap();
        let json = payload.to_json();
        assert!(json.contains("\"entry.1\": \"Ada\""));
        assert!(json.contains("\"pageHistory\": \"0,1\""));
    }
}
