//! Error types for the WebDriver client

use thiserror::Error;

/// Result type alias using the WebDriver error
pub type Result<T> = std::result::Result<T, WebDriverError>;

/// Errors raised while talking to the automation server
#[derive(Error, Debug)]
pub enum WebDriverError {
    #[error("no such element: {0}")]
    NoSuchElement(String),

    #[error("stale element reference: {0}")]
    StaleElement(String),

    #[error("invalid session id: {0}")]
    InvalidSession(String),

    #[error("session not created: {0}")]
    SessionNotCreated(String),

    #[error("{error} (HTTP {status}): {message}")]
    Protocol {
        status: u16,
        error: String,
        message: String,
    },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Screenshot decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl WebDriverError {
    /// Build an error from a W3C error code
    pub fn from_w3c(status: u16, error: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match error {
            "no such element" => Self::NoSuchElement(message),
            "stale element reference" => Self::StaleElement(message),
            "invalid session id" => Self::InvalidSession(message),
            "session not created" => Self::SessionNotCreated(message),
            _ => Self::Protocol {
                status,
                error: error.to_string(),
                message,
            },
        }
    }

    /// Build an error from a legacy JSON Wire Protocol status code
    pub fn from_legacy_status(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            7 => Self::NoSuchElement(message),
            10 => Self::StaleElement(message),
            6 => Self::InvalidSession(message),
            33 => Self::SessionNotCreated(message),
            _ => Self::Protocol {
                status: 500,
                error: format!("status {}", code),
                message,
            },
        }
    }

    /// Whether a lookup may succeed if retried later.
    ///
    /// Only "the element is not on screen (yet)" conditions qualify; lost
    /// sessions and transport failures do not.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoSuchElement(_) | Self::StaleElement(_))
    }
}
