use thiserror::Error;

/// Errors returned by a model backend.
///
/// `Api` carries the HTTP status so retry decisions never have to look at
/// message text. The other variants are untyped from the dispatcher's point
/// of view; see [`crate::dispatch::classify`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

impl AiError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        AiError::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP status reported by the backend, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => AiError::Api {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => AiError::Network(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for AiError {
    fn from(e: serde_json::Error) -> Self {
        AiError::Parse(e.to_string())
    }
}
