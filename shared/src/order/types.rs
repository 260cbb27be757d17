//! Shared types for the order lifecycle

use serde::{Deserialize, Serialize};

/// Maximum number of payment sessions that may be opened per order
pub const MAX_PAYMENT_ATTEMPTS: u32 = 3;

// ============================================================================
// Line Items
// ============================================================================

/// Line item input - raw item as submitted by a caller or carried on an
/// application cart. Validated and resolved by the pricing calculator,
/// never trusted at use-sites.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItemInput {
    /// Catalog item ID
    pub id: String,
    /// Item name snapshot
    pub name: String,
    /// Unit price in currency units
    pub unit_price: f64,
    /// Quantity
    pub quantity: i32,
}

/// Resolved line item - output of the pricing calculator, with the
/// computed line total frozen alongside the inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Catalog item ID
    pub id: String,
    /// Item name snapshot
    pub name: String,
    /// Unit price in currency units
    pub unit_price: f64,
    /// Quantity
    pub quantity: i32,
    /// Line total (unit_price * quantity, rounded to currency precision)
    pub line_total: f64,
}

/// Pricing breakdown produced by the calculator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pricing {
    /// Sum of all line totals
    pub items_total: f64,
    /// Applied discount, clamped to [0, items_total]
    pub discount_amount: f64,
    /// max(0, items_total - discount_amount) + delivery_cost
    pub final_amount: f64,
    /// Items with computed line totals
    pub resolved_items: Vec<LineItem>,
}

// ============================================================================
// Order Status
// ============================================================================

/// Order lifecycle status
///
/// `Completed` and `Cancelled` are terminal. All legal moves are encoded in
/// [`OrderStatus::can_transition_to`]; nothing else is ever written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Draft,
    Submitted,
    PendingPayment,
    Paid,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Whether this status is terminal (no further transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the order has reached `Paid` or a later state
    pub fn at_or_past_paid(&self) -> bool {
        matches!(self, Self::Paid | Self::Processing | Self::Completed)
    }

    /// The hand-coded lifecycle transition table
    ///
    /// | From            | To              | Trigger                               |
    /// |-----------------|-----------------|---------------------------------------|
    /// | Draft           | Submitted       | explicit submit                       |
    /// | Submitted       | PendingPayment  | payment session created               |
    /// | Submitted       | Processing      | corporate (invoice-billed) approval   |
    /// | PendingPayment  | Paid            | gateway reports charged               |
    /// | PendingPayment  | PendingPayment  | retried payment session               |
    /// | Paid            | Processing      | scheduler (T-2 days) or manual        |
    /// | Processing      | Completed       | scheduler (delivery day) or manual    |
    /// | any non-terminal| Cancelled       | manual cancellation                   |
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        match (self, to) {
            (Self::Draft, Self::Submitted) => true,
            (Self::Submitted, Self::PendingPayment) => true,
            (Self::Submitted, Self::Processing) => true,
            (Self::PendingPayment, Self::Paid) => true,
            (Self::PendingPayment, Self::PendingPayment) => true,
            (Self::Paid, Self::Processing) => true,
            (Self::Processing, Self::Completed) => true,
            (from, Self::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Stable string label, matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::Paid => "PAID",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

// ============================================================================
// Payment Status
// ============================================================================

/// Online payment status of an order
///
/// `Charged` is the terminal success state and is never downgraded.
/// Corporate (invoice-billed) clients stay at `None` forever.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    None,
    Pending,
    Authorized,
    Charged,
    Failed,
}

/// Terminal payment outcome reported by the gateway callback or polling
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOutcome {
    Charged,
    Failed,
}

impl PaymentOutcome {
    /// Parse a raw gateway status string. Anything the engine does not
    /// recognize is rejected rather than stored verbatim.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CHARGED" => Some(Self::Charged),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

// ============================================================================
// Delivery
// ============================================================================

/// Fulfillment type for an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryType {
    #[default]
    Delivery,
    Pickup,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Draft.is_terminal());
        assert!(!OrderStatus::PendingPayment.is_terminal());
    }

    #[test]
    fn test_transition_table_allows() {
        use OrderStatus::*;
        assert!(Draft.can_transition_to(Submitted));
        assert!(Submitted.can_transition_to(PendingPayment));
        assert!(Submitted.can_transition_to(Processing));
        assert!(PendingPayment.can_transition_to(Paid));
        assert!(PendingPayment.can_transition_to(PendingPayment));
        assert!(Paid.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
    }

    #[test]
    fn test_any_non_terminal_can_cancel() {
        use OrderStatus::*;
        for from in [Draft, Submitted, PendingPayment, Paid, Processing] {
            assert!(from.can_transition_to(Cancelled), "{:?}", from);
        }
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn test_transition_table_rejects() {
        use OrderStatus::*;
        assert!(!Draft.can_transition_to(Paid));
        assert!(!Draft.can_transition_to(Processing));
        assert!(!Submitted.can_transition_to(Paid));
        assert!(!Paid.can_transition_to(Submitted));
        assert!(!Paid.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Cancelled.can_transition_to(Submitted));
    }

    #[test]
    fn test_at_or_past_paid() {
        assert!(OrderStatus::Paid.at_or_past_paid());
        assert!(OrderStatus::Processing.at_or_past_paid());
        assert!(OrderStatus::Completed.at_or_past_paid());
        assert!(!OrderStatus::PendingPayment.at_or_past_paid());
        assert!(!OrderStatus::Cancelled.at_or_past_paid());
    }

    #[test]
    fn test_payment_outcome_parse() {
        assert_eq!(PaymentOutcome::parse("CHARGED"), Some(PaymentOutcome::Charged));
        assert_eq!(PaymentOutcome::parse("charged"), Some(PaymentOutcome::Charged));
        assert_eq!(PaymentOutcome::parse(" failed "), Some(PaymentOutcome::Failed));
        assert_eq!(PaymentOutcome::parse("REFUNDED"), None);
        assert_eq!(PaymentOutcome::parse(""), None);
    }

    #[test]
    fn test_status_serde_screaming_snake() {
        let json = serde_json::to_string(&OrderStatus::PendingPayment).unwrap();
        assert_eq!(json, "\"PENDING_PAYMENT\"");
        let back: OrderStatus = serde_json::from_str("\"PENDING_PAYMENT\"").unwrap();
        assert_eq!(back, OrderStatus::PendingPayment);
    }
}
