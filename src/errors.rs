use axum::http::StatusCode;
use thiserror::Error;
use tracing::error;

/// Failures raised by the ledger and everything built on top of it.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("{0}")]
    Validation(String),

    #[error("activity '{0}' not found")]
    ActivityNotFound(String),

    #[error("ledger connection lock poisoned")]
    LockPoisoned,
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Storage failures may succeed on a second attempt; rejections never do.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        error!("request failed: {err}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal error".to_string(),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(message) => Self::bad_request(message),
            LedgerError::ActivityNotFound(_) => Self::not_found(err.to_string()),
            LedgerError::Storage(_) | LedgerError::LockPoisoned => Self::internal(err),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_errors_map_to_http_status() {
        let err: AppError = LedgerError::validation("Amount cannot be negative").into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Amount cannot be negative");

        let err: AppError = LedgerError::ActivityNotFound("nope".into()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err: AppError = LedgerError::LockPoisoned.into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "internal error");
    }

    #[test]
    fn only_storage_failures_are_retryable() {
        let storage = LedgerError::Storage(rusqlite::Error::InvalidQuery);
        assert!(storage.is_retryable());
        assert!(!LedgerError::validation("bad").is_retryable());
        assert!(!LedgerError::ActivityNotFound("x".into()).is_retryable());
    }
}
