//! Core types for decoded form schemas
//!
//! Defines the typed field descriptors produced by the decoder:
//! - Field identifiers and their wire-key formatting
//! - Field type codes and selection refinement
//! - Option labels (including the free-text marker)
//! - The ordered `FormSchema` container

use serde::{Deserialize, Serialize};

/// A field's provider-assigned identifier.
///
/// Ordinary fields carry a numeric id; synthetic fields (email collection,
/// page history) carry a provider-reserved string id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldId {
    /// Numeric id assigned by the provider
    Numeric(u64),
    /// Provider-reserved id for synthetic fields
    Reserved(String),
}

impl FieldId {
    /// Reserved id for the email-collection synthetic field
    pub const EMAIL: &'static str = "emailAddress";
    /// Reserved id for the page-history synthetic field
    pub const PAGE_HISTORY: &'static str = "pageHistory";

    /// Format the wire key the submission target expects.
    ///
    /// Numeric ids become `entry.<id>`; reserved ids pass through unchanged.
    #[must_use]
    pub fn entry_key(&self) -> String {
        match self {
            Self::Numeric(n) => format!("entry.{n}"),
            Self::Reserved(s) => s.clone(),
        }
    }

    /// Check whether this is a provider-reserved (synthetic) id
    #[inline]
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::Reserved(_))
    }

    /// Check whether this is the page-history synthetic id
    #[inline]
    #[must_use]
    pub fn is_page_history(&self) -> bool {
        matches!(self, Self::Reserved(s) if s == Self::PAGE_HISTORY)
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Reserved(s) => write!(f, "{s}"),
        }
    }
}

/// Field type codes used by the provider's schema payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Short answer text
    ShortText,
    /// Paragraph text
    Paragraph,
    /// Single choice (radio)
    SingleChoice,
    /// Dropdown selection
    Dropdown,
    /// Multiple choice (checkboxes)
    MultiChoice,
    /// Linear scale
    LinearScale,
    /// Grid choice
    Grid,
    /// Date
    Date,
    /// Time
    Time,
    /// Unrecognized type code
    Other,
}

impl FieldType {
    /// Map a provider type code to a field type.
    ///
    /// Code 8 is the reserved page-break group type and is handled by the
    /// decoder before this mapping applies; unknown codes map to `Other`.
    #[must_use]
    pub fn from_code(code: u64) -> Self {
        match code {
            0 => Self::ShortText,
            1 => Self::Paragraph,
            2 => Self::SingleChoice,
            3 => Self::Dropdown,
            4 => Self::MultiChoice,
            5 => Self::LinearScale,
            7 => Self::Grid,
            9 => Self::Date,
            10 => Self::Time,
            _ => Self::Other,
        }
    }

    /// Human-readable label for review output
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::ShortText => "Short answer",
            Self::Paragraph => "Paragraph",
            Self::SingleChoice => "Single choice",
            Self::Dropdown => "Dropdown",
            Self::MultiChoice => "Checkboxes",
            Self::LinearScale => "Linear scale",
            Self::Grid => "Grid choice",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::Other => "Free text",
        }
    }
}

/// Selection refinement for choice-bearing field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// Choose exactly one option (radio)
    Single,
    /// Choose exactly one option (dropdown)
    Dropdown,
    /// Choose all applicable options
    Multi,
}

/// A single option label within a choice field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionLabel {
    /// Fixed display label
    Text(String),
    /// The field accepts arbitrary input for this option
    FreeText,
}

/// A decoded form field descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Provider-assigned field id (unique within a schema)
    pub id: FieldId,
    /// Display name of the containing field group
    pub group_name: String,
    /// Subfield name, joined from name-path segments when present
    pub subfield_name: Option<String>,
    /// Field type code
    pub field_type: FieldType,
    /// Whether the field must be present in a submission
    pub required: bool,
    /// Ordered option labels (empty for non-choice fields)
    pub options: Vec<OptionLabel>,
    /// Fixed default value, set only for synthesized fields
    pub default_value: Option<String>,
}

impl FieldDescriptor {
    /// Create a new descriptor with no options and no default
    #[must_use]
    pub fn new(id: FieldId, group_name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id,
            group_name: group_name.into(),
            subfield_name: None,
            field_type,
            required: false,
            options: Vec::new(),
            default_value: None,
        }
    }

    /// With required flag
    #[inline]
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// With subfield name
    #[inline]
    #[must_use]
    pub fn with_subfield(mut self, name: impl Into<String>) -> Self {
        self.subfield_name = Some(name.into());
        self
    }

    /// With option labels
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: Vec<OptionLabel>) -> Self {
        self.options = options;
        self
    }

    /// With a fixed default value (synthetic fields)
    #[inline]
    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Question text shown to the answer pipeline and reviewers.
    ///
    /// Group name, with the subfield name appended when present.
    #[must_use]
    pub fn question_text(&self) -> String {
        match &self.subfield_name {
            Some(name) => format!("{}: {}", self.group_name, name),
            None => self.group_name.clone(),
        }
    }

    /// Selection refinement, for the three choice-bearing type codes only
    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        match self.field_type {
            FieldType::SingleChoice => Some(Selection::Single),
            FieldType::Dropdown => Some(Selection::Dropdown),
            FieldType::MultiChoice => Some(Selection::Multi),
            _ => None,
        }
    }

    /// Fixed option labels, excluding the free-text marker
    #[must_use]
    pub fn choice_labels(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter_map(|o| match o {
                OptionLabel::Text(s) => Some(s.as_str()),
                OptionLabel::FreeText => None,
            })
            .collect()
    }

    /// Whether this field enters the answer-generation pipeline.
    ///
    /// Fields carrying a fixed default (page history) bypass compilation
    /// and go straight to the submission builder.
    #[inline]
    #[must_use]
    pub fn is_compilable(&self) -> bool {
        self.default_value.is_none()
    }
}

/// An ordered, decoded form schema.
///
/// Insertion order of `fields` is the form's display order. A schema is
/// immutable once decoded; re-decoding produces a fresh instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    /// Ordered field descriptors, ids unique
    pub fields: Vec<FieldDescriptor>,
    /// Count of pagination boundaries encountered while decoding
    pub page_count: u32,
    /// Whether the form collects the respondent's email address
    pub collects_email: bool,
}

impl FormSchema {
    /// Fields surfaced to a human reviewer (excludes the page-history
    /// synthetic, which must never reach review output)
    pub fn reviewable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| !f.id.is_page_history())
    }

    /// Fields that must be present in a submission
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.required)
    }

    /// Fields dispatched to the answer-generation pipeline
    pub fn compilable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_compilable())
    }

    /// Number of fields in the schema
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
