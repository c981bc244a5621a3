//! API Error Types
//!
//! Errors raised while talking to the wardrobe backend.

use thiserror::Error;

/// Errors that can occur when calling the wardrobe backend
#[derive(Error, Debug)]
pub enum ApiError {
    /// Backend could not be reached
    #[error("Wardrobe backend unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    /// Body was not the shape the endpoint promises
    #[error("Malformed response: {0}")]
    Decode(String),

    /// Request was rejected before reaching the backend
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    /// Classify a transport error the way the rest of the client reports it
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::Unavailable
        } else {
            ApiError::Request(err)
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Result type for backend calls
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::Status {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "API error 404: Not Found");

        let err = ApiError::Decode("expected a list".to_string());
        assert_eq!(err.to_string(), "Malformed response: expected a list");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ApiError = json_err.into();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
