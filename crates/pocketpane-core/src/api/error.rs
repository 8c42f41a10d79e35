use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The user has not approved the request token yet.
    #[error("Authorization pending - waiting for approval in the browser")]
    AuthorizationPending,

    #[error("Pocket returned {status}: {message}")]
    Status {
        status: StatusCode,
        /// Pocket's `X-Error-Code`, when sent
        code: Option<u16>,
        message: String,
    },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Could not decode response from {url}: {reason} (response: {body})")]
    Decode {
        url: String,
        body: String,
        reason: String,
    },
}

/// Maximum length for response bodies in error messages and logs
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Build an error for a non-success status.
    ///
    /// Pocket puts the human readable reason in the `X-Error` header and
    /// usually leaves the body empty, so the header wins when present.
    pub fn from_status(
        status: StatusCode,
        code: Option<u16>,
        error_header: Option<&str>,
        body: &str,
    ) -> Self {
        let reason = match error_header {
            Some(reason) if !reason.trim().is_empty() => reason.trim().to_string(),
            _ if !body.trim().is_empty() => Self::truncate_body(body.trim()),
            _ => status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
        };
        let message = match code {
            Some(code) => format!("{} (error {})", reason, code),
            None => reason,
        };
        ApiError::Status {
            status,
            code,
            message,
        }
    }

    pub fn decode(url: &str, body: &str, reason: impl Into<String>) -> Self {
        ApiError::Decode {
            url: url.to_string(),
            body: Self::truncate_body(body),
            reason: reason.into(),
        }
    }

    /// Whether this is the expected "not approved yet" outcome
    pub fn is_pending(&self) -> bool {
        matches!(self, ApiError::AuthorizationPending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_prefers_error_header() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            Some(138),
            Some("Missing consumer key."),
            "",
        );
        assert_eq!(
            err.to_string(),
            "Pocket returned 400 Bad Request: Missing consumer key. (error 138)"
        );
    }

    #[test]
    fn test_from_status_falls_back_to_body_then_reason() {
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, None, None, "upstream down");
        assert!(err.to_string().ends_with("upstream down"));

        let err = ApiError::from_status(StatusCode::SERVICE_UNAVAILABLE, None, Some("  "), "");
        assert!(err.to_string().ends_with("Service Unavailable"));
    }

    #[test]
    fn test_truncate_body() {
        let short = "short body";
        assert_eq!(ApiError::truncate_body(short), short);

        let long = "x".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(truncated.ends_with("(truncated, 520 total bytes)"));
    }

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        // 'é' is two bytes, so the cut lands mid-character without the boundary walk
        let long = format!("a{}", "é".repeat(MAX_ERROR_BODY_LENGTH));
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("... (truncated"));
    }

    #[test]
    fn test_is_pending() {
        assert!(ApiError::AuthorizationPending.is_pending());
        assert!(!ApiError::decode("u", "b", "r").is_pending());
    }
}
