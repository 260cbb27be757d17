//! Error type and result alias

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the primary error type for the engine, providing:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details for debugging
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (field-level errors, context, etc.)
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

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not found error for a generic resource
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create an order-not-found error
    pub fn order_not_found(order_id: impl Into<String>) -> Self {
        let id = order_id.into();
        Self::with_message(ErrorCode::OrderNotFound, format!("Order {} not found", id))
            .with_detail("order_id", id)
    }

    /// Create an application-not-found error
    pub fn application_not_found(application_id: impl Into<String>) -> Self {
        let id = application_id.into();
        Self::with_message(
            ErrorCode::ApplicationNotFound,
            format!("Application {} not found", id),
        )
        .with_detail("application_id", id)
    }

    /// Create a client-not-found error
    pub fn client_not_found(client_id: impl Into<String>) -> Self {
        let id = client_id.into();
        Self::with_message(ErrorCode::ClientNotFound, format!("Client {} not found", id))
            .with_detail("client_id", id)
    }

    /// Create an illegal transition error
    pub fn illegal_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        let (from, to) = (from.into(), to.into());
        Self::with_message(
            ErrorCode::IllegalTransition,
            format!("Cannot transition order from {} to {}", from, to),
        )
        .with_detail("from", from)
        .with_detail("to", to)
    }

    /// Create a terminal-order error
    pub fn order_terminal(order_id: impl Into<String>) -> Self {
        let id = order_id.into();
        Self::with_message(
            ErrorCode::OrderTerminal,
            format!("Order {} is in a terminal state", id),
        )
        .with_detail("order_id", id)
    }

    /// Create a payment-attempts-exhausted error
    pub fn attempts_exhausted(order_id: impl Into<String>) -> Self {
        Self::new(ErrorCode::PaymentAttemptsExhausted).with_detail("order_id", order_id.into())
    }

    /// Create a corporate-invoice-only error
    pub fn corporate_invoice_only() -> Self {
        Self::new(ErrorCode::CorporateInvoiceOnly)
    }

    /// Create a gateway error
    pub fn gateway(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::GatewayUnavailable, msg)
    }

    /// Create an unknown-gateway-status error
    pub fn unknown_gateway_status(status: impl Into<String>) -> Self {
        let s = status.into();
        Self::with_message(
            ErrorCode::UnknownGatewayStatus,
            format!("Unknown gateway payment status: {}", s),
        )
        .with_detail("status", s)
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::StorageError, msg)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
