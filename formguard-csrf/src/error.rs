use http::StatusCode;
use thiserror::Error;

/// Message shown to the user when a request fails the token check.
pub const SESSION_EXPIRED_MESSAGE: &str =
    "Your session has expired. Please reload the page and try again.";

#[derive(Error, Debug)]
pub enum CsrfError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Secure random source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("CSRF token mismatch")]
    TokenMismatch,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CsrfError {
    /// HTTP status to answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CsrfError::TokenMismatch => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text that is safe to show to the end user.
    ///
    /// Never contains token, secret or cookie material.
    pub fn user_message(&self) -> &'static str {
        match self {
            CsrfError::TokenMismatch => SESSION_EXPIRED_MESSAGE,
            _ => "Internal server error",
        }
    }

    /// Whether the error must stop the process rather than a single request.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CsrfError::Configuration(_) | CsrfError::EntropyUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CsrfError>;

/// Why a fallback cookie did not yield a stored token.
///
/// Never surfaces past the token store; every variant reads as
/// "no stored token".
#[derive(Error, Debug)]
pub enum CookieError {
    #[error("cookie not present")]
    Missing,

    #[error("missing hash separator")]
    MissingSeparator,

    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("payload is not a valid token record: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("payload carries no token")]
    MissingToken,
}
