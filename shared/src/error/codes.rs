//! Unified error codes for the catering engine
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order / application errors
//! - 5xxx: Payment errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
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

    // ==================== 4xxx: Order / Application ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Status transition not allowed by the lifecycle table
    IllegalTransition = 4002,
    /// Order is in a terminal state and can no longer change
    OrderTerminal = 4003,
    /// Order has no line items
    OrderEmpty = 4004,
    /// Application not found
    ApplicationNotFound = 4101,
    /// Application has already been converted into an order
    ApplicationAlreadyConverted = 4102,
    /// Application was rejected and cannot be converted
    ApplicationRejected = 4103,
    /// Client not found
    ClientNotFound = 4201,
    /// A client with this email already exists
    ClientAlreadyExists = 4202,

    // ==================== 5xxx: Payment ====================
    /// Payment processing failed
    PaymentFailed = 5001,
    /// Payment attempt limit reached
    PaymentAttemptsExhausted = 5002,
    /// Corporate clients are billed by invoice, not online payment
    CorporateInvoiceOnly = 5003,
    /// Payment gateway unreachable or returned an error
    GatewayUnavailable = 5004,
    /// Gateway reported a payment status the engine does not recognize
    UnknownGatewayStatus = 5005,
    /// Order status does not allow payment
    PaymentNotAllowed = 5006,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Storage failure
    StorageError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default message for this error code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",

            Self::OrderNotFound => "Order not found",
            Self::IllegalTransition => "Status transition not allowed",
            Self::OrderTerminal => "Order is in a terminal state",
            Self::OrderEmpty => "Order has no line items",
            Self::ApplicationNotFound => "Application not found",
            Self::ApplicationAlreadyConverted => "Application has already been converted",
            Self::ApplicationRejected => "Application was rejected",
            Self::ClientNotFound => "Client not found",
            Self::ClientAlreadyExists => "Client already exists",

            Self::PaymentFailed => "Payment processing failed",
            Self::PaymentAttemptsExhausted => "Payment attempt limit reached",
            Self::CorporateInvoiceOnly => "Corporate clients are billed by invoice",
            Self::GatewayUnavailable => "Payment gateway unavailable",
            Self::UnknownGatewayStatus => "Unknown gateway payment status",
            Self::PaymentNotAllowed => "Order status does not allow payment",

            Self::InternalError => "Internal server error",
            Self::StorageError => "Storage failure",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> u16 {
        code.code()
    }
}

/// Error returned when a u16 does not map to a known [`ErrorCode`]
#[derive(Debug, Clone, PartialEq, Eq)]
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
        let code = match value {
            0 => Self::Success,
            1 => Self::Unknown,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            4 => Self::AlreadyExists,
            5 => Self::InvalidRequest,

            4001 => Self::OrderNotFound,
            4002 => Self::IllegalTransition,
            4003 => Self::OrderTerminal,
            4004 => Self::OrderEmpty,
            4101 => Self::ApplicationNotFound,
            4102 => Self::ApplicationAlreadyConverted,
            4103 => Self::ApplicationRejected,
            4201 => Self::ClientNotFound,
            4202 => Self::ClientAlreadyExists,

            5001 => Self::PaymentFailed,
            5002 => Self::PaymentAttemptsExhausted,
            5003 => Self::CorporateInvoiceOnly,
            5004 => Self::GatewayUnavailable,
            5005 => Self::UnknownGatewayStatus,
            5006 => Self::PaymentNotAllowed,

            9001 => Self::InternalError,
            9002 => Self::StorageError,

            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}
