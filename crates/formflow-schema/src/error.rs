//! Error types for schema decoding and transport
//!
//! Decode- and submission-time failures are returned as typed results;
//! nothing in this crate recovers by retrying internally.

/// Schema decoding and transport errors
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The page loaded but carries no public schema, or the fetch failed
    #[error("schema unavailable: {reason}")]
    Unavailable {
        /// Human-readable reason
        reason: String,
    },

    /// The embedded schema payload did not match the expected structure
    #[error("malformed schema payload at {context}")]
    Malformed {
        /// Position in the payload where the mismatch occurred
        context: String,
    },

    /// HTTP transport failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The submission endpoint rejected the payload
    #[error("submission rejected with status {status}")]
    SubmitFailed {
        /// HTTP status code of the rejection
        status: u16,
    },
}

impl SchemaError {
    /// Unavailability with a reason
    #[inline]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Structural mismatch at a payload position
    #[inline]
    pub fn malformed(context: impl Into<String>) -> Self {
        Self::Malformed {
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SchemaError::unavailable("likely requires authentication");
        assert!(err.to_string().contains("likely requires authentication"));

        let err = SchemaError::SubmitFailed { status: 403 };
        assert!(err.to_string().contains("403"));
    }
}
