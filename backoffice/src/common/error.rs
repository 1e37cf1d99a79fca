//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! `AdminError`は`code()`と`status_code()`メソッドを提供し、
//! どのハンドラーから発生しても同じ形のエラーレスポンスを生成できます。

use axum::http::StatusCode;
use thiserror::Error;

/// Back-office error type
///
/// Each variant is one error kind. Kinds are never conflated: callers match
/// on the variant to decide how to react (e.g. refresh on `TokenExpired`).
#[derive(Debug, Error)]
pub enum AdminError {
    /// Referenced entity does not exist or is soft-deleted
    #[error("Not found: {0}")]
    NotFound(String),

    /// A unique-constraint field collided
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Credential mismatch (login or password change)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Bad signature, malformed token or wrong audience
    #[error("Token invalid: {0}")]
    TokenInvalid(String),

    /// Token is well-formed but past its expiry
    #[error("Token expired: {0}")]
    TokenExpired(String),

    /// No token was presented
    #[error("Token missing: {0}")]
    TokenMissing(String),

    /// Authenticated but not authorized for the action
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Request failed validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Idempotency token absent or already used
    #[error("Idempotency check failed: {0}")]
    IdempotencyViolation(String),

    /// Storage-layer failure not matching a more specific kind
    #[error("Operation failed: {0}")]
    OperationFailed(String),

    /// Too many requests from one client within the limiter window
    #[error("Server busy: {0}")]
    ServerBusy(String),

    /// Internal failure in a non-storage step (hashing, signing, cache tier)
    #[error("Service error: {0}")]
    ServiceError(String),

    /// Configuration rejected at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Token subject is empty
    #[error("Invalid subject: {0}")]
    InvalidSubject(String),
}

impl AdminError {
    /// Returns a safe error message for external clients.
    ///
    /// Client-caused kinds keep their detail so the caller can fix the request.
    /// Server-side kinds return a fixed summary; the full detail only goes to logs.
    pub fn external_message(&self) -> String {
        match self {
            Self::OperationFailed(_) => "Operation failed".to_string(),
            Self::ServiceError(_) => "Service error".to_string(),
            Self::InvalidConfiguration(_) => "Service error".to_string(),
            Self::InvalidSubject(_) => "Service error".to_string(),
            other => other.to_string(),
        }
    }

    /// Returns the stable machine-readable business code for this error.
    pub fn code(&self) -> u32 {
        match self {
            Self::AuthenticationFailed(_) => 1002,
            Self::TokenInvalid(_) => 1003,
            Self::TokenExpired(_) => 1004,
            Self::TokenMissing(_) => 1005,
            Self::PermissionDenied(_) => 1006,
            Self::InvalidRequest(_) => 2001,
            Self::IdempotencyViolation(_) => 2002,
            Self::NotFound(_) => 3001,
            Self::OperationFailed(_) => 3002,
            Self::DuplicateKey(_) => 3003,
            Self::ServerBusy(_) => 4001,
            Self::ServiceError(_) => 4002,
            Self::InvalidConfiguration(_) => 4003,
            Self::InvalidSubject(_) => 4004,
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationFailed(_)
            | Self::TokenInvalid(_)
            | Self::TokenExpired(_)
            | Self::TokenMissing(_) => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::InvalidRequest(_) | Self::IdempotencyViolation(_) | Self::DuplicateKey(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ServerBusy(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::OperationFailed(_)
            | Self::ServiceError(_)
            | Self::InvalidConfiguration(_)
            | Self::InvalidSubject(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns true for kinds the server is responsible for (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

/// Result type alias
pub type AdminResult<T> = Result<T, AdminError>;
