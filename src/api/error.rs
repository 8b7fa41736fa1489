use thiserror::Error;

/// Envelope status for invalid username/password on login.
pub const STATUS_INVALID_CREDENTIALS: u32 = 2003;
/// Envelope status the API uses for an invalid or expired bearer token.
pub const STATUS_INVALID_TOKEN: u32 = 2002;

/// Maximum number of error body characters kept in an error message.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("config error: {0}")]
    Config(String),
    #[error("unable to reach the auth API: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("request rejected ({code}): {message}")]
    Rejected { code: u32, message: String },
    #[error("response error: {0}")]
    Decode(String),
}

impl AuthError {
    /// True when the failure happened before the API produced an answer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }

    /// Envelope status code when the API answered with a non-success status.
    #[must_use]
    pub const fn code(&self) -> Option<u32> {
        match self {
            Self::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Message sent by the API, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } | Self::Http { message, .. } if !message.is_empty() => {
                Some(message.as_str())
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Trims and truncates error bodies before they end up in messages.
pub(crate) fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
