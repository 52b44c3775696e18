//! Query compilation
//!
//! Turns each field descriptor into a natural-language query plus
//! per-type answering instructions. Three templates apply, keyed on the
//! field's selection refinement: single-select/dropdown, multi-select,
//! and free-form factual.
//!
//! Revision feedback, when present, is appended verbatim to every query
//! of the cycle, not only the field it most plausibly concerns. That
//! broad application is deliberate and preserved as-is; see the
//! feedback-loop tests.

use crate::types::Query;
use formflow_schema::{FieldDescriptor, FormSchema, Selection};

/// Compile one field into a query.
///
/// Fields carrying a fixed default value are excluded from compilation
/// entirely; use [`compile_all`] to compile a schema's compilable fields.
#[must_use]
pub fn compile(field: &FieldDescriptor, feedback: Option<&str>) -> Query {
    let question = field.question_text();
    let entry_id = field.id.entry_key();
    let options = field.choice_labels().join(", ");

    let mut text = match field.selection() {
        Some(Selection::Single) | Some(Selection::Dropdown) => format!(
            "Based on the candidate profile, which of the following options best \
             answers this question?\n\
             Question ID: {entry_id}\n\
             Question: {question}\n\
             Options: {options}\n\
             Choose exactly one option, the one best supported by the candidate's \
             experience and qualifications."
        ),
        Some(Selection::Multi) => format!(
            "Based on the candidate profile, which of the following options apply \
             to this question?\n\
             Question ID: {entry_id}\n\
             Question: {question}\n\
             Options: {options}\n\
             Choose all options supported by the candidate's experience and \
             qualifications."
        ),
        None => format!(
            "Based on the candidate profile, provide a factual answer to this \
             question:\n\
             Question ID: {entry_id}\n\
             Question: {question}\n\
             Keep the answer specific and concise."
        ),
    };

    if let Some(feedback) = feedback {
        text.push_str(&format!(
            "\nEarlier we received feedback on the answers to this form. It may \
             not concern this field, but take it into account:\n\
             <feedback>\n{feedback}\n</feedback>"
        ));
    }

    Query {
        field_id: entry_id,
        question,
        text,
        type_hint: field.selection(),
        required: field.required,
    }
}

/// Compile every compilable field of a schema, in schema order
#[must_use]
pub fn compile_all(schema: &FormSchema, feedback: Option<&str>) -> Vec<Query> {
    schema
        .compilable_fields()
        .map(|field| compile(field, feedback))
        .collect()
}
