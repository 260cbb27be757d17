//! Application entity - unconfirmed inbound request, precursor to an Order

use crate::order::LineItemInput;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Application status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    #[default]
    New,
    Processing,
    Approved,
    Rejected,
}

/// Application entity
///
/// Created by public submission, mutated by coordinator decisions, converted
/// into an [`Order`](crate::models::Order) at most once. `order_id` is the
/// stored convert-once guard alongside the status check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Application {
    pub id: String,

    // === Contact ===
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,

    // === Event ===
    /// Requested items, same shape as order line items
    pub cart_items: Vec<LineItemInput>,
    pub event_date: NaiveDate,
    pub event_time: Option<String>,
    pub event_address: Option<String>,

    // === Processing ===
    pub status: ApplicationStatus,
    /// Resolved client, if the applicant is a known customer
    pub client_id: Option<String>,
    /// Coordinator who processed the application
    pub coordinator_id: Option<String>,
    /// Unix millis when the application was approved or rejected
    pub processed_at: Option<i64>,
    /// Back-link to the order created from this application
    pub order_id: Option<String>,

    pub created_at: i64,
}

impl Application {
    /// Whether this application can still be converted into an order
    pub fn is_convertible(&self) -> bool {
        matches!(
            self.status,
            ApplicationStatus::New | ApplicationStatus::Processing
        ) && self.order_id.is_none()
    }
}
