//! Formflow Schema - published-form schema decoding
//!
//! Turns an externally hosted form's published page into a structured,
//! ordered field schema:
//! - Locates the script-embedded schema variable in the page HTML
//! - Decodes the nested-array payload into typed [`FieldDescriptor`]s
//! - Appends the synthetic email and page-history fields
//! - Derives the submission endpoint and performs the final POST
//!
//! # Example
//!
//! ```rust,ignore
//! use formflow_schema::FormClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = FormClient::new();
//! let schema = client.fetch_schema("https://example.com/forms/d/e/abc/viewform").await?;
//!
//! for field in schema.reviewable_fields() {
//!     println!("{} (required: {})", field.question_text(), field.required);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod client;
pub mod decode;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use client::FormClient;
pub use decode::{decode_page, decode_tree, extract_schema_variable, submit_url, SCHEMA_VAR};
pub use error::SchemaError;
pub use types::{
    FieldDescriptor, FieldId, FieldType, FormSchema, OptionLabel, Selection,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
