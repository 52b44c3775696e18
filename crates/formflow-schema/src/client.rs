//! HTTP transport for schema pages and submissions
//!
//! [`FormClient`] owns the reqwest client and covers both ends of a run:
//! fetching the published page for decoding, and posting the final
//! form-encoded payload to the derived submission endpoint.

use crate::decode::{decode_page, submit_url};
use crate::error::SchemaError;
use crate::types::FormSchema;
use std::time::Duration;

/// Default per-request timeout for page fetches and submissions
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the form provider
#[derive(Debug, Clone)]
pub struct FormClient {
    http: reqwest::Client,
}

impl FormClient {
    /// Create a client with the default request timeout
    #[must_use]
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http }
    }

    /// Create a client wrapping a preconfigured reqwest client
    #[inline]
    #[must_use]
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Fetch a form's published page and decode its embedded schema.
    ///
    /// # Errors
    /// - [`SchemaError::Unavailable`] on a non-200 response or when the
    ///   page carries no public schema variable
    /// - [`SchemaError::Malformed`] on a structural mismatch in the payload
    pub async fn fetch_schema(&self, viewer_url: &str) -> Result<FormSchema, SchemaError> {
        tracing::info!(url = viewer_url, "fetching form schema page");
        let response = self.http.get(viewer_url).send().await?;
        let status = response.status();

        if status.as_u16() != 200 {
            tracing::warn!(status = status.as_u16(), "schema page fetch failed");
            return Err(SchemaError::unavailable(format!(
                "schema page returned status {}",
                status.as_u16()
            )));
        }

        let html = response.text().await?;
        decode_page(&html)
    }

    /// Submit form-encoded values to the endpoint derived from the viewer
    /// URL. Success is HTTP 200; any other status is surfaced with its
    /// code so the caller can decide whether to retry.
    pub async fn submit(
        &self,
        viewer_url: &str,
        values: &[(String, String)],
    ) -> Result<(), SchemaError> {
        let url = submit_url(viewer_url);
        tracing::info!(url = url.as_str(), entries = values.len(), "submitting form");

        let response = self.http.post(&url).form(values).send().await?;
        let status = response.status().as_u16();

        if status != 200 {
            tracing::warn!(status, "form submission rejected");
            return Err(SchemaError::SubmitFailed { status });
        }
        Ok(())
    }
}

impl Default for FormClient {
    fn default() -> Self {
        Self::new()
    }
}
