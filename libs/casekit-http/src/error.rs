use reqwest::StatusCode;
use thiserror::Error;

/// Fallback message for errors that carry no server-provided detail.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

/// HTTP client error types.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    /// Configured base URL could not be parsed or joined with a path.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Transport error (connection refused, DNS failure, reset, etc.).
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// HTTP non-2xx status. `detail` is the server's structured message
    /// when one was returned, otherwise empty.
    #[error("HTTP {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    /// Authentication expired and could not be recovered by a refresh.
    #[error("session expired")]
    SessionExpired,

    /// A request body could not be serialized, or a response body could
    /// not be decoded as the expected shape.
    #[error("JSON conversion failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A multipart payload part was invalid (e.g. malformed MIME type).
    #[error("invalid multipart payload: {0}")]
    Multipart(String),
}

impl HttpError {
    /// Map a reqwest error, separating timeouts from other transport
    /// failures.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }

    /// The HTTP status, when this error carries one.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::SessionExpired => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }

    /// True for a 404 on a single-resource get/delete.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Human-readable message suitable for direct display.
    ///
    /// Server-provided validation/business messages pass through verbatim;
    /// transport and decoding failures collapse to a generic fallback.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { detail, .. } if !detail.is_empty() => detail.clone(),
            Self::SessionExpired => "Your session has expired. Please sign in again.".to_owned(),
            _ => GENERIC_ERROR_MESSAGE.to_owned(),
        }
    }
}

/// Extract the FastAPI-style `{"detail": "..."}` message from an error
/// body, falling back to the raw body when it is short and printable.
#[must_use]
pub(crate) fn extract_detail(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(detail) = value.get("detail").and_then(|d| d.as_str())
    {
        return detail.to_owned();
    }
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.len() > 256 {
        String::new()
    } else {
        trimmed.to_owned()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn detail_extracted_from_json_body() {
        assert_eq!(
            extract_detail(r#"{"detail": "Address not found"}"#),
            "Address not found"
        );
    }

    #[test]
    fn non_json_body_passes_through_when_short() {
        assert_eq!(extract_detail("bad gateway"), "bad gateway");
        assert_eq!(extract_detail(""), "");
        assert_eq!(extract_detail(&"x".repeat(1000)), "");
    }

    #[test]
    fn user_message_prefers_server_detail() {
        let err = HttpError::Status {
            status: StatusCode::BAD_REQUEST,
            detail: "Employer cannot be deleted".to_owned(),
        };
        assert_eq!(err.user_message(), "Employer cannot be deleted");
    }

    #[test]
    fn user_message_falls_back_for_transport_failures() {
        let err = HttpError::Timeout;
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);

        let err = HttpError::Status {
            status: StatusCode::BAD_GATEWAY,
            detail: String::new(),
        };
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn not_found_classification() {
        let err = HttpError::Status {
            status: StatusCode::NOT_FOUND,
            detail: "Notification not found".to_owned(),
        };
        assert!(err.is_not_found());
        assert!(!HttpError::Timeout.is_not_found());
    }
}
