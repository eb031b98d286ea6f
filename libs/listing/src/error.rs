//! Error types for boundary parsing of list-view input

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ParseSelectionError>;

/// Raised when operator input does not name a known categorical value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseSelectionError {
    #[error("Unknown {field} '{value}' (expected one of: all, {expected})")]
    UnknownValue {
        field: &'static str,
        value: String,
        expected: String,
    },
}
