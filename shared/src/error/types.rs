//! Error types

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the primary error type surfaced by every service:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details (ids, field names, underlying causes)
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Whether the caller may retry later
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create an already exists error
    pub fn already_exists(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::AlreadyExists, format!("{} already exists", r))
            .with_detail("resource", r)
    }

    /// Create an invalid credentials error
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    /// Create a user not found error
    pub fn user_not_found(username: impl Into<String>) -> Self {
        let u = username.into();
        Self::with_message(ErrorCode::UserNotFound, format!("User {} not found", u))
            .with_detail("username", u)
    }

    /// Create a report not found error
    pub fn report_not_found(id: i64) -> Self {
        Self::with_message(ErrorCode::ReportNotFound, format!("Report {} not found", id))
            .with_detail("report_id", id)
    }

    /// Create a ticket not found error
    pub fn ticket_not_found(id: i64) -> Self {
        Self::with_message(ErrorCode::TicketNotFound, format!("Ticket {} not found", id))
            .with_detail("ticket_id", id)
    }

    /// Create an empty data error (sync rejected)
    pub fn empty_data(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::EmptyData, msg)
    }

    /// Create a no connectivity error
    pub fn no_connectivity() -> Self {
        Self::new(ErrorCode::NoConnectivity)
    }

    /// Create a remote store error
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::RemoteError, msg)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    /// Create a local storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::StorageError, msg)
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ConfigError, msg)
    }

    /// Create a cancelled error
    pub fn cancelled() -> Self {
        Self::new(ErrorCode::Cancelled)
    }
}

impl From<ErrorCode> for AppError {
    fn from(code: ErrorCode) -> Self {
        Self::new(code)
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::NotFound);
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Resource not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_message() {
        let err = AppError::with_message(ErrorCode::ValidationFailed, "Fare must not be negative");
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.message, "Fare must not be negative");
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::validation("Missing required fields")
            .with_detail("field", "departure")
            .with_detail("index", 2);

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let details = err.details.unwrap();
        assert_eq!(details.get("field").unwrap(), "departure");
        assert_eq!(details.get("index").unwrap(), 2);
    }

    #[test]
    fn test_app_error_convenience_constructors() {
        let err = AppError::not_found("Route");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Route not found");
        assert!(err.details.as_ref().unwrap().contains_key("resource"));

        let err = AppError::report_not_found(7);
        assert_eq!(err.code, ErrorCode::ReportNotFound);
        assert_eq!(err.message, "Report 7 not found");

        let err = AppError::ticket_not_found(3);
        assert_eq!(err.details.unwrap().get("ticket_id").unwrap(), 3);

        let err = AppError::no_connectivity();
        assert_eq!(err.code, ErrorCode::NoConnectivity);
        assert!(err.is_retryable());

        let err = AppError::empty_data("route r1 has no stops");
        assert_eq!(err.code, ErrorCode::EmptyData);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::database("disk I/O error");
        assert_eq!(format!("{}", err), "disk I/O error");
    }

    #[test]
    fn test_app_error_from_code() {
        let err: AppError = ErrorCode::TicketAlreadyClosed.into();
        assert_eq!(err.message, ErrorCode::TicketAlreadyClosed.message());
    }
}
