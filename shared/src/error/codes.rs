//! Unified error codes for the fare ledger
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 4xxx: Report errors
//! - 5xxx: Ticket errors
//! - 6xxx: Sync errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so they survive any
/// serialization boundary unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Auth ====================
    /// Invalid username or password
    InvalidCredentials = 1002,
    /// User not found
    UserNotFound = 1008,

    // ==================== 4xxx: Report ====================
    /// Report not found
    ReportNotFound = 4001,
    /// Another report is still open
    ReportAlreadyOpen = 4002,
    /// Report is fully closed
    ReportClosed = 4003,
    /// Report has already been partially closed
    ReportAlreadyPartiallyClosed = 4004,

    // ==================== 5xxx: Ticket ====================
    /// Ticket not found
    TicketNotFound = 5001,
    /// Ticket was already voided
    TicketAlreadyNullified = 5002,
    /// Ticket is locked by a partial close
    TicketAlreadyClosed = 5003,
    /// Ticket belongs to another report
    TicketNotInReport = 5004,

    // ==================== 6xxx: Sync ====================
    /// Remote data failed validity checks
    EmptyData = 6001,
    /// No network connectivity
    NoConnectivity = 6002,
    /// Remote store returned an error
    RemoteError = 6003,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
    /// Local cache storage error
    StorageError = 9004,
    /// Operation cancelled
    Cancelled = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Whether a caller may reasonably retry the failed operation later
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::NoConnectivity | ErrorCode::RemoteError | ErrorCode::Cancelled
        )
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",

            // Auth
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::UserNotFound => "User not found",

            // Report
            ErrorCode::ReportNotFound => "Report not found",
            ErrorCode::ReportAlreadyOpen => "Another report is already open",
            ErrorCode::ReportClosed => "Report is closed",
            ErrorCode::ReportAlreadyPartiallyClosed => "Report is already partially closed",

            // Ticket
            ErrorCode::TicketNotFound => "Ticket not found",
            ErrorCode::TicketAlreadyNullified => "Ticket is already nullified",
            ErrorCode::TicketAlreadyClosed => "Ticket was sold before the partial close",
            ErrorCode::TicketNotInReport => "Ticket does not belong to this report",

            // Sync
            ErrorCode::EmptyData => "Remote data is empty or invalid",
            ErrorCode::NoConnectivity => "No internet connection",
            ErrorCode::RemoteError => "Remote store request failed",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::StorageError => "Local storage error",
            ErrorCode::Cancelled => "Operation cancelled",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),

            // Auth
            1002 => Ok(ErrorCode::InvalidCredentials),
            1008 => Ok(ErrorCode::UserNotFound),

            // Report
            4001 => Ok(ErrorCode::ReportNotFound),
            4002 => Ok(ErrorCode::ReportAlreadyOpen),
            4003 => Ok(ErrorCode::ReportClosed),
            4004 => Ok(ErrorCode::ReportAlreadyPartiallyClosed),

            // Ticket
            5001 => Ok(ErrorCode::TicketNotFound),
            5002 => Ok(ErrorCode::TicketAlreadyNullified),
            5003 => Ok(ErrorCode::TicketAlreadyClosed),
            5004 => Ok(ErrorCode::TicketNotInReport),

            // Sync
            6001 => Ok(ErrorCode::EmptyData),
            6002 => Ok(ErrorCode::NoConnectivity),
            6003 => Ok(ErrorCode::RemoteError),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),
            9004 => Ok(ErrorCode::StorageError),
            9005 => Ok(ErrorCode::Cancelled),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}
