//! Error types for the REST client

use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Shown when a failure carries no structured message.
pub const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

/// Client errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned HTTP {status}: {}", .body.message().unwrap_or("no details"))]
    Api { status: u16, body: ApiErrorBody },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Operator-facing message: the body's `error` field, else `detail`,
    /// else the first field validation error, else [`FALLBACK_MESSAGE`].
    pub fn display_message(&self) -> String {
        match self {
            Self::Api { body, .. } => body
                .message()
                .map(str::to_string)
                .or_else(|| body.field_message().map(str::to_string))
                .unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
            _ => FALLBACK_MESSAGE.to_string(),
        }
    }

    /// Fields named by a restore conflict, empty otherwise.
    pub fn conflict_fields(&self) -> &[String] {
        match self {
            Self::Api { body, .. } => &body.conflict_fields,
            _ => &[],
        }
    }
}

/// Structured error body returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub conflict_fields: Vec<String>,
    /// Validation errors keyed by field, e.g.
    /// `{"old_password": ["Old password is incorrect."]}`.
    #[serde(flatten)]
    pub field_errors: BTreeMap<String, JsonValue>,
}

impl ApiErrorBody {
    /// Parse a response body; anything that is not a JSON object yields an
    /// empty body.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        serde_json::from_slice(bytes).unwrap_or_default()
    }

    pub fn message(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or(self.detail.as_deref())
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }

    /// First message found in [`ApiErrorBody::field_errors`], in field order.
    pub fn field_message(&self) -> Option<&str> {
        self.field_errors
            .values()
            .find_map(|value| match value {
                JsonValue::String(message) => Some(message.as_str()),
                JsonValue::Array(items) => items.iter().find_map(JsonValue::as_str),
                _ => None,
            })
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}
