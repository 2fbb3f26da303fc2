use thiserror::Error;

/// Generic text shown for transport failures. The caller cannot tell a dead
/// backend from a flaky network, so the advice is the same for both.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Could not reach the server. Check your connection and try again.";

/// Client-level error type.
/// Every API Client failure resolves to one of these; none are dropped silently.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Rejected credentials or a duplicate registration.
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export unavailable: {0}")]
    ExportUnavailable(String),

    #[error("Another request is already in flight")]
    Busy,
}

/// Coarse grouping of failures. The CLI turns it into the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Network,
    Validation,
    Server,
    ExportUnavailable,
    Local,
}

impl ErrorKind {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Local => 1,
            ErrorKind::Validation => 2,
            ErrorKind::Auth => 3,
            ErrorKind::Network => 4,
            ErrorKind::Server => 5,
            ErrorKind::ExportUnavailable => 6,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Http(e)
        }
    }
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::Auth(_) | ClientError::Unauthorized => ErrorKind::Auth,
            ClientError::Api { .. } | ClientError::Parse(_) => ErrorKind::Server,
            ClientError::Timeout | ClientError::Http(_) => ErrorKind::Network,
            ClientError::ExportUnavailable(_) => ErrorKind::ExportUnavailable,
            ClientError::Storage(_) | ClientError::Io(_) | ClientError::Busy => ErrorKind::Local,
        }
    }

    /// Text suitable for showing next to the control that triggered the request.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(msg) | ClientError::Auth(msg) => msg.clone(),
            ClientError::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Timeout | ClientError::Http(_) => NETWORK_ERROR_MESSAGE.to_string(),
            ClientError::Parse(_) => "The server sent a response we could not read.".to_string(),
            ClientError::Storage(_) | ClientError::Io(_) => {
                "A local storage error occurred".to_string()
            }
            ClientError::ExportUnavailable(msg) => msg.clone(),
            ClientError::Busy => "Please wait for the current request to finish.".to_string(),
        }
    }
}
