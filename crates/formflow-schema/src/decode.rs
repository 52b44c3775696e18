//! Schema payload decoding
//!
//! A published form page embeds its schema as a script variable holding a
//! deeply nested array structure. This module locates that variable and
//! walks the tree with a strict position-indexed parser, producing an
//! ordered [`FormSchema`]. Structural mismatches fail fast with a typed
//! error naming the offending position instead of surfacing deep in later
//! stages.

use crate::error::SchemaError;
use crate::types::{FieldDescriptor, FieldId, FieldType, FormSchema, OptionLabel};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

/// Name of the script variable holding the embedded schema payload
pub const SCHEMA_VAR: &str = "FB_PUBLIC_LOAD_DATA_";

/// Group type code reserved for pagination boundaries
const PAGE_BREAK_TYPE: u64 = 8;

/// Viewer path segment replaced when deriving the submission endpoint
const VIEWER_SEGMENT: &str = "/viewform";

/// Submission path segment of the provider
const SUBMIT_SEGMENT: &str = "formResponse";

static SCHEMA_VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"var\s+{SCHEMA_VAR}\s*=\s*(.*?);"))
        .expect("schema variable pattern is valid")
});

/// Extract the embedded schema variable's raw value from page HTML
#[must_use]
pub fn extract_schema_variable(html: &str) -> Option<&str> {
    SCHEMA_VAR_PATTERN
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Decode a fetched page's HTML into a [`FormSchema`].
///
/// # Errors
/// - [`SchemaError::Unavailable`] if the page carries no public schema
///   variable (typically a login-gated form)
/// - [`SchemaError::Malformed`] on structural mismatch in the payload
pub fn decode_page(html: &str) -> Result<FormSchema, SchemaError> {
    let raw = extract_schema_variable(html)
        .ok_or_else(|| SchemaError::unavailable("likely requires authentication"))?;
    let tree: Value = serde_json::from_str(raw)
        .map_err(|e| SchemaError::malformed(format!("schema variable is not valid JSON: {e}")))?;
    decode_tree(&tree)
}

/// Decode the parsed schema tree into a [`FormSchema`].
///
/// Decoding the same tree twice yields equal schemas.
pub fn decode_tree(tree: &Value) -> Result<FormSchema, SchemaError> {
    let body = index(tree, 1, "root")?;
    let groups = as_array(index(body, 1, "root[1]")?, "root[1][1]")?;

    let mut fields = Vec::new();
    let mut page_count: u32 = 0;

    for (gi, group) in groups.iter().enumerate() {
        let ctx = format!("group[{gi}]");
        let type_code = as_u64(index(group, 3, &ctx)?, &format!("{ctx}[3]"))?;

        if type_code == PAGE_BREAK_TYPE {
            page_count += 1;
            continue;
        }

        // Title/media items carry no subfield list; they contribute no field.
        let subfields = match group.get(4) {
            None | Some(Value::Null) => continue,
            Some(v) => as_array(v, &format!("{ctx}[4]"))?,
        };

        let group_name = as_str(index(group, 1, &ctx)?, &format!("{ctx}[1]"))?;
        let field_type = FieldType::from_code(type_code);

        for (si, sub) in subfields.iter().enumerate() {
            let sctx = format!("{ctx}.sub[{si}]");
            fields.push(decode_subfield(sub, group_name, field_type, &sctx)?);
        }
    }

    let collects_email = email_collection_enabled(body);
    if collects_email {
        fields.push(
            FieldDescriptor::new(
                FieldId::Reserved(FieldId::EMAIL.to_string()),
                "Email Address",
                FieldType::ShortText,
            )
            .required(true),
        );
    }

    if page_count > 0 {
        let history = (0..=page_count)
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",");
        fields.push(
            FieldDescriptor::new(
                FieldId::Reserved(FieldId::PAGE_HISTORY.to_string()),
                "Page History",
                FieldType::Other,
            )
            .required(true)
            .with_default(history),
        );
    }

    check_unique_ids(&fields)?;

    tracing::debug!(
        field_count = fields.len(),
        page_count,
        collects_email,
        "decoded form schema"
    );

    Ok(FormSchema {
        fields,
        page_count,
        collects_email,
    })
}

/// Derive the submission endpoint from the form's viewer URL.
///
/// Replaces the viewer path segment with the submit segment, appending the
/// submit segment if the URL carries neither.
#[must_use]
pub fn submit_url(viewer_url: &str) -> String {
    let mut url = viewer_url.replace(VIEWER_SEGMENT, &format!("/{SUBMIT_SEGMENT}"));
    if !url.ends_with(SUBMIT_SEGMENT) {
        if !url.ends_with('/') {
            url.push('/');
        }
        url.push_str(SUBMIT_SEGMENT);
    }
    url
}

fn decode_subfield(
    sub: &Value,
    group_name: &str,
    field_type: FieldType,
    ctx: &str,
) -> Result<FieldDescriptor, SchemaError> {
    let id = as_u64(index(sub, 0, ctx)?, &format!("{ctx}[0]"))?;

    let options = match sub.get(1) {
        None | Some(Value::Null) => Vec::new(),
        Some(v) => as_array(v, &format!("{ctx}[1]"))?
            .iter()
            .map(|opt| match opt.get(0) {
                Some(Value::String(label)) if !label.is_empty() => OptionLabel::Text(label.clone()),
                _ => OptionLabel::FreeText,
            })
            .collect(),
    };

    let required = matches!(sub.get(2).and_then(Value::as_u64), Some(1));

    let subfield_name = sub.get(3).and_then(Value::as_array).and_then(|segments| {
        let parts: Vec<&str> = segments.iter().filter_map(Value::as_str).collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" - "))
        }
    });

    let mut field = FieldDescriptor::new(FieldId::Numeric(id), group_name, field_type)
        .required(required)
        .with_options(options);
    field.subfield_name = subfield_name;
    Ok(field)
}

/// Top-level settings flag: email collection is enabled when the value at
/// `[1][10][6]` exceeds 1.
fn email_collection_enabled(body: &Value) -> bool {
    body.get(10)
        .and_then(|settings| settings.get(6))
        .and_then(Value::as_u64)
        .is_some_and(|flag| flag > 1)
}

fn check_unique_ids(fields: &[FieldDescriptor]) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(&field.id) {
            return Err(SchemaError::malformed(format!(
                "duplicate field id {}",
                field.id
            )));
        }
    }
    Ok(())
}

fn index<'a>(v: &'a Value, idx: usize, ctx: &str) -> Result<&'a Value, SchemaError> {
    v.get(idx)
        .ok_or_else(|| SchemaError::malformed(format!("{ctx}[{idx}] missing")))
}

fn as_array<'a>(v: &'a Value, ctx: &str) -> Result<&'a Vec<Value>, SchemaError> {
    v.as_array()
        .ok_or_else(|| SchemaError::malformed(format!("{ctx} is not an array")))
}

fn as_u64(v: &Value, ctx: &str) -> Result<u64, SchemaError> {
    v.as_u64()
        .ok_or_else(|| SchemaError::malformed(format!("{ctx} is not an unsigned integer")))
}

fn as_str<'a>(v: &'a Value, ctx: &str) -> Result<&'a str, SchemaError> {
    v.as_str()
        .ok_or_else(|| SchemaError::malformed(format!("{ctx} is not a string")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_tree() -> Value {
        json!([
            null,
            [
                null,
                [
                    ["desc", "Full Name", null, 0, [[1001, null, 1]]],
                    ["desc", "Phone", null, 0, [[1002, null, 1, ["Mobile"]]]],
                    ["desc", "Preferred Stack", null, 3, [[1003, [["Rust"], ["Go"], [""]], 0]]],
                    [null, null, null, 8],
                    ["desc", "About You", null, 1, [[1004, null, 0]]]
                ],
                null,
                null,
                null,
                null,
                null,
                null,
                null,
                null,
                [null, null, null, null, null, null, 3]
            ]
        ])
    }

    fn sample_html() -> String {
        format!(
            "<html><script>var {SCHEMA_VAR} = {};</script></html>",
            sample_tree()
        )
    }

    #[test]
    fn extract_variable_from_html() {
        let html = sample_html();
        let raw = extract_schema_variable(&html).unwrap();
        let parsed: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed, sample_tree());
    }

    #[test]
    fn extract_variable_absent() {
        assert!(extract_schema_variable("<html>login required</html>").is_none());
    }

    #[test]
    fn decode_counts_pages_and_skips_breaks() {
        let schema = decode_tree(&sample_tree()).unwrap();
        assert_eq!(schema.page_count, 1);
        // 4 subfields + email synthetic + page history synthetic
        assert_eq!(schema.len(), 6);
    }

    #[test]
    fn decode_subfield_positions() {
        let schema = decode_tree(&sample_tree()).unwrap();

        let name = &schema.fields[0];
        assert_eq!(name.id, FieldId::Numeric(1001));
        assert_eq!(name.group_name, "Full Name");
        assert!(name.required);
        assert_eq!(name.field_type, FieldType::ShortText);

        let phone = &schema.fields[1];
        assert_eq!(phone.subfield_name.as_deref(), Some("Mobile"));
        assert_eq!(phone.question_text(), "Phone: Mobile");

        let stack = &schema.fields[2];
        assert_eq!(stack.field_type, FieldType::Dropdown);
        assert!(!stack.required);
        assert_eq!(
            stack.options,
            vec![
                OptionLabel::Text("Rust".to_string()),
                OptionLabel::Text("Go".to_string()),
                OptionLabel::FreeText,
            ]
        );
    }

    #[test]
    fn decode_appends_email_synthetic() {
        let schema = decode_tree(&sample_tree()).unwrap();
        assert!(schema.collects_email);

        let email = schema
            .fields
            .iter()
            .find(|f| f.id == FieldId::Reserved(FieldId::EMAIL.to_string()))
            .unwrap();
        assert!(email.required);
        assert_eq!(email.id.entry_key(), "emailAddress");
    }

    #[test]
    fn decode_appends_page_history_with_default() {
        let schema = decode_tree(&sample_tree()).unwrap();

        let history = schema
            .fields
            .iter()
            .find(|f| f.id == FieldId::Reserved(FieldId::PAGE_HISTORY.to_string()))
            .unwrap();
        assert_eq!(history.default_value.as_deref(), Some("0,1"));
        assert!(!history.is_compilable());
        // Never surfaced to review
        assert!(schema
            .reviewable_fields()
            .all(|f| f.id != FieldId::Reserved(FieldId::PAGE_HISTORY.to_string())));
    }

    #[test]
    fn decode_is_deterministic() {
        let tree = sample_tree();
        assert_eq!(decode_tree(&tree).unwrap(), decode_tree(&tree).unwrap());
    }

    #[test]
    fn decode_page_without_variable_is_unavailable() {
        let err = decode_page("<html>please sign in</html>").unwrap_err();
        match err {
            SchemaError::Unavailable { reason } => {
                assert!(reason.contains("authentication"));
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_malformed_group() {
        // Group type code is a string instead of an integer
        let tree = json!([null, [null, [["d", "Q", null, "oops", [[1, null, 1]]]]]]);
        let err = decode_tree(&tree).unwrap_err();
        assert!(matches!(err, SchemaError::Malformed { .. }));
    }

    #[test]
    fn decode_rejects_duplicate_ids() {
        let tree = json!([
            null,
            [null, [["d", "Q", null, 0, [[7, null, 1], [7, null, 0]]]]]
        ]);
        let err = decode_tree(&tree).unwrap_err();
        assert!(matches!(err, SchemaError::Malformed { .. }));
    }

    #[test]
    fn decode_skips_title_items_without_subfields() {
        let tree = json!([
            null,
            [null, [["d", "Welcome", null, 6], ["d", "Q", null, 0, [[5, null, 0]]]]]
        ]);
        let schema = decode_tree(&tree).unwrap();
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn submit_url_replaces_viewer_segment() {
        assert_eq!(
            submit_url("https://example.com/forms/d/e/abc/viewform"),
            "https://example.com/forms/d/e/abc/formResponse"
        );
    }

    #[test]
    fn submit_url_appended_when_absent() {
        assert_eq!(
            submit_url("https://example.com/forms/d/e/abc"),
            "https://example.com/forms/d/e/abc/formResponse"
        );
        assert_eq!(
            submit_url("https://example.com/forms/d/e/abc/"),
            "https://example.com/forms/d/e/abc/formResponse"
        );
    }
}
