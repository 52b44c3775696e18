//! Testing utilities for the formflow workspace
//!
//! Shared fixtures and scripted fakes for the answer-source and
//! completion-model seams.

#![allow(missing_docs)]

use async_trait::async_trait;
use formflow_core::{AnswerSource, CompletionModel, SourceError};
use formflow_schema::{FieldDescriptor, FieldId, FieldType, FormSchema, OptionLabel};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Completion model that replays a scripted sequence of outputs.
///
/// Each `complete` call pops the next entry; an exhausted script fails
/// like an unreachable backend.
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedModel {
    pub fn new(outputs: Vec<&str>) -> Self {
        Self {
            script: Mutex::new(outputs.iter().map(|s| Ok(s.to_string())).collect()),
        }
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, _prompt: &str) -> Result<String, SourceError> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(msg)) => Err(SourceError::new(msg)),
            None => Err(SourceError::new("scripted model exhausted")),
        }
    }
}

/// Answer source that derives a deterministic answer from the query text
/// and records every query it sees.
#[derive(Default)]
pub struct RecordingSource {
    queries: Mutex<Vec<String>>,
}

impl RecordingSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every query seen so far, in dispatch order
    pub fn seen(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerSource for RecordingSource {
    async fn ask(&self, query: &str) -> Result<String, SourceError> {
        self.queries.lock().unwrap().push(query.to_string());
        let id = query
            .lines()
            .find_map(|l| l.strip_prefix("Question ID: ").map(str::trim))
            .unwrap_or("unknown");
        Ok(format!("generated answer for {id}"))
    }
}

/// Answer source whose backend is entirely unreachable
pub struct UnreachableSource;

#[async_trait]
impl AnswerSource for UnreachableSource {
    async fn ask(&self, _query: &str) -> Result<String, SourceError> {
        Err(SourceError::new("knowledge index unreachable"))
    }
}

/// The scenario schema: two required text fields plus an optional dropdown
pub fn three_field_schema() -> FormSchema {
    FormSchema {
        fields: vec![
            FieldDescriptor::new(FieldId::Numeric(1001), "Full Name", FieldType::ShortText)
                .required(true),
            FieldDescriptor::new(FieldId::Numeric(1002), "Phone", FieldType::ShortText)
                .required(true),
            FieldDescriptor::new(FieldId::Numeric(1003), "Preferred Stack", FieldType::Dropdown)
                .with_options(vec![
                    OptionLabel::Text("Rust".to_string()),
                    OptionLabel::Text("Go".to_string()),
                ]),
        ],
        page_count: 0,
        collects_email: false,
    }
}

/// A consolidation output matching [`three_field_schema`], as strict JSON
pub fn three_field_consolidation() -> String {
    serde_json::json!({
        "answers": [
            {"entry_id": "entry.1001", "question": "Full Name", "answer": "Ada Lovelace"},
            {"entry_id": "entry.1002", "question": "Phone", "answer": "+44 20 1234 5678"},
            {"entry_id": "entry.1003", "question": "Preferred Stack", "answer": "Rust"}
        ]
    })
    .to_string()
}

/// Same consolidation with a corrected phone number, for revise cycles
pub fn corrected_consolidation() -> String {
    serde_json::json!({
        "answers": [
            {"entry_id": "entry.1001", "question": "Full Name", "answer": "Ada Lovelace"},
            {"entry_id": "entry.1002", "question": "Phone", "answer": "+44 20 9999 0000"},
            {"entry_id": "entry.1003", "question": "Preferred Stack", "answer": "Rust"}
        ]
    })
    .to_string()
}
