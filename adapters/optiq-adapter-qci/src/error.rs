//! Error types for the QCi adapter.

use optiq_hal::HalError;
use thiserror::Error;

/// Result type for QCi operations.
pub type QciResult<T> = Result<T, QciError>;

/// Errors that can occur when talking to the QCi API.
#[derive(Debug, Error)]
pub enum QciError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Missing API token.
    #[error("Missing QCi API token (set QCI_TOKEN)")]
    MissingToken,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response did not have the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Encoding or sample error.
    #[error("Model error: {0}")]
    Model(#[from] optiq_model::ModelError),

    /// API error response.
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },
}

impl From<QciError> for HalError {
    fn from(e: QciError) -> Self {
        match e {
            QciError::MissingToken | QciError::AuthFailed(_) => {
                HalError::AuthenticationFailed(e.to_string())
            }
            QciError::NotFound(id) => HalError::JobNotFound(id),
            QciError::Http(e) => HalError::Network(e),
            QciError::Model(e) => HalError::Model(e),
            _ => HalError::Backend(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_display() {
        assert!(QciError::MissingToken.to_string().contains("QCI_TOKEN"));
    }

    #[test]
    fn test_api_error_display() {
        let err = QciError::ApiError {
            status: 422,
            message: "bad file".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("422"));
        assert!(msg.contains("bad file"));
    }

    #[test]
    fn test_not_found_to_hal() {
        let hal: HalError = QciError::NotFound("j1".into()).into();
        assert!(matches!(hal, HalError::JobNotFound(id) if id == "j1"));
    }

    #[test]
    fn test_auth_to_hal() {
        let hal: HalError = QciError::AuthFailed("expired".into()).into();
        assert!(matches!(hal, HalError::AuthenticationFailed(_)));
        let hal: HalError = QciError::MissingToken.into();
        assert!(matches!(hal, HalError::AuthenticationFailed(_)));
    }

    #[test]
    fn test_malformed_to_hal_backend() {
        let hal: HalError = QciError::MalformedResponse("no energies".into()).into();
        assert!(matches!(hal, HalError::Backend(_)));
    }
}
