//! Order entity

use crate::order::{DeliveryType, LineItem, OrderStatus, PaymentStatus, Pricing};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Order entity - the central record of the engine
///
/// Derived money fields (`items_total`, `discount_amount`, `final_amount`)
/// are recomputed by the pricing calculator at every mutation site and
/// written together with the fields that changed, never lazily.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,

    // === Ownership ===
    /// Owning client (required)
    pub client_id: String,
    /// Assigned staff coordinator
    pub coordinator_id: Option<String>,
    /// Originating application, when converted rather than created directly
    pub application_id: Option<String>,

    // === Commercial ===
    pub menu_items: Vec<LineItem>,
    /// Sum of line totals in currency units
    pub items_total: f64,
    /// Fixed discount component as entered
    pub discount_fixed: f64,
    /// Percentage discount component as entered (0-100)
    pub discount_percent: f64,
    /// Derived: min(items_total, discount_fixed + items_total * percent/100)
    pub discount_amount: f64,
    /// Delivery cost, never discounted
    pub delivery_cost: f64,
    /// Derived: max(0, items_total - discount_amount) + delivery_cost
    pub final_amount: f64,

    // === Fulfillment ===
    pub delivery_date: NaiveDate,
    /// Time slot label, e.g. "12:30"
    pub delivery_time: Option<String>,
    pub delivery_type: DeliveryType,
    pub delivery_address: Option<String>,

    // === Status ===
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Number of payment sessions opened, bounded by MAX_PAYMENT_ATTEMPTS
    pub payment_attempts: u32,
    /// Gateway session id for the most recent payment attempt
    pub gateway_order_id: Option<String>,
    pub payment_url: Option<String>,
    /// Unix millis when the current payment session was opened
    pub payment_created_at: Option<i64>,
    /// Unix millis when the gateway first reported charged
    pub payment_completed_at: Option<i64>,
    /// Comment recorded with the latest manual status change
    pub status_comment: Option<String>,

    // === Audit ===
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Whether status and payment fields are frozen
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Write a pricing breakdown into the derived money fields
    pub fn apply_pricing(&mut self, pricing: Pricing) {
        self.items_total = pricing.items_total;
        self.discount_amount = pricing.discount_amount;
        self.final_amount = pricing.final_amount;
        self.menu_items = pricing.resolved_items;
    }
}
