//! Error types for the console

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Client(#[from] casedesk_client::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not logged in; run `casedesk login` first")]
    NotLoggedIn,

    #[error("Session expired; run `casedesk login` again")]
    SessionExpired,

    #[error("{0}")]
    Login(String),

    #[error("{0}")]
    ActionFailed(String),
}

impl Error {
    /// Message suitable for showing to the operator.
    pub fn display_message(&self) -> String {
        match self {
            Self::Client(e @ casedesk_client::Error::Api { .. }) => e.display_message(),
            other => other.to_string(),
        }
    }
}
