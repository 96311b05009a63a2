use thiserror::Error;

/// Network-level failures, including caller cancellation.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request was cancelled")]
    Cancelled,

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors that can occur when talking to the recipe API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Transport(#[from] TransportError),

    #[error("Server returned status {status}")]
    Server { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decoding(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(TransportError::Http(e))
    }
}

impl ApiError {
    pub fn cancelled() -> Self {
        ApiError::Transport(TransportError::Cancelled)
    }

    /// Canceled work is not a failure and is never shown to the user.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Transport(TransportError::Cancelled))
    }

    /// Short message suitable for display, or `None` for cancellation.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            ApiError::InvalidUrl(_) => Some("Invalid search query. Please try something else."),
            ApiError::Transport(TransportError::Cancelled) => None,
            ApiError::Transport(TransportError::Http(_)) => {
                Some("Network error. Please check your connection and try again.")
            }
            ApiError::Server { .. } => Some("Server error. Please try again later."),
            ApiError::Decoding(_) => Some("Unexpected response from server."),
        }
    }

    /// HTTP status for server errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}
