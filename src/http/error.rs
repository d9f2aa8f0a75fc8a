//! HTTP client errors and the API error body.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Errors produced by [`super::HttpClient`] operations.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The server answered with a non-2xx status.
    #[error("API error: status {status}: {}", .body.message())]
    Api { status: u16, body: ApiErrorBody },

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Connection refused, reset, DNS failure and similar transport errors.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be deserialized.
    #[error("response decode failed: {0}")]
    Decode(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),

    /// A record failed client-side validation; no request was sent.
    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl HttpError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }

    /// HTTP status for API errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short message suitable for a toast or snackbar.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { body, .. } => body.message().to_owned(),
            Self::Timeout => "The server took too long to respond.".to_owned(),
            Self::Network(_) => "Unable to reach the server.".to_owned(),
            Self::Validation(errors) => {
                let mut fields: Vec<String> = errors.field_errors().keys().map(ToString::to_string).collect();
                fields.sort_unstable();
                format!("Please correct: {}", fields.join(", "))
            }
            Self::Decode(_) | Self::InvalidUrl(_) | Self::ClientBuild(_) => "Something went wrong.".to_owned(),
        }
    }
}

impl ErrorCode for HttpError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Api { .. } => "E_API_RESPONSE",
            Self::Timeout => "E_TIMEOUT",
            Self::Network(_) => "E_NETWORK",
            Self::Decode(_) => "E_DECODE",
            Self::InvalidUrl(_) => "E_INVALID_URL",
            Self::ClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Validation(_) => "E_VALIDATION",
        }
    }

    /// 500, 404 and 429 are never retried; other 5xx gateway errors and 408
    /// are treated as transient along with timeouts and transport failures.
    fn retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Network(_) => true,
            Self::Api { status, .. } => matches!(status, 408 | 502 | 503 | 504),
            _ => false,
        }
    }
}

// =============================================================================
// ERROR BODY
// =============================================================================

/// A single rejected request parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidParam {
    pub name: String,
    pub reason: String,
}

/// Problem-details style error body returned by the API.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiErrorBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub status: Option<u16>,
    pub detail: String,
    pub instance: String,
    pub invalid_params: Vec<InvalidParam>,
}

impl ApiErrorBody {
    /// Parse a response body; non-JSON text becomes `detail`.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        serde_json::from_str::<Self>(text).unwrap_or_else(|_| Self {
            detail: text.trim().to_owned(),
            ..Self::default()
        })
    }

    #[must_use]
    pub fn message(&self) -> &str {
        if !self.detail.is_empty() {
            &self.detail
        } else if !self.title.is_empty() {
            &self.title
        } else {
            "request failed"
        }
    }

    /// Reason attached to a rejected parameter, for inline form errors.
    #[must_use]
    pub fn param_error(&self, name: &str) -> Option<&str> {
        self.invalid_params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.reason.as_str())
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
