//! Order creation, editing and manual status changes
//!
//! Every mutation is one write transaction: read current state, validate
//! against it, write the result. The notification dispatch happens after
//! the commit, never inside it.

use crate::db::{EngineStorage, StorageError};
use crate::notify::{self, NotificationDispatcher};
use crate::pricing;
use crate::utils::time::Clock;
use chrono::NaiveDate;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{ClientCategory, Order};
use shared::order::{DeliveryType, LineItemInput, OrderStatus, PaymentStatus};
use std::sync::Arc;

/// Input for creating an order directly (coordinator flow)
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub client_id: String,
    pub coordinator_id: Option<String>,
    pub application_id: Option<String>,
    pub menu_items: Vec<LineItemInput>,
    pub discount_fixed: f64,
    pub discount_percent: f64,
    pub delivery_cost: f64,
    pub delivery_date: NaiveDate,
    pub delivery_time: Option<String>,
    pub delivery_type: DeliveryType,
    pub delivery_address: Option<String>,
    /// Create directly in SUBMITTED instead of DRAFT
    pub submit: bool,
}

/// Partial update for an existing order; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub menu_items: Option<Vec<LineItemInput>>,
    pub discount_fixed: Option<f64>,
    pub discount_percent: Option<f64>,
    pub delivery_cost: Option<f64>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: Option<Option<String>>,
    pub delivery_type: Option<DeliveryType>,
    pub delivery_address: Option<Option<String>>,
}

impl OrderPatch {
    /// Whether this patch touches a money-bearing field
    fn changes_commercial_terms(&self) -> bool {
        self.menu_items.is_some()
            || self.discount_fixed.is_some()
            || self.discount_percent.is_some()
            || self.delivery_cost.is_some()
    }
}

/// Order lifecycle service
#[derive(Clone)]
pub struct OrderService {
    storage: EngineStorage,
    dispatcher: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
}

impl OrderService {
    pub fn new(
        storage: EngineStorage,
        dispatcher: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            dispatcher,
            clock,
        }
    }

    /// Fetch an order by id
    pub fn get_order(&self, order_id: &str) -> AppResult<Order> {
        Ok(self.storage.get_order(order_id)?)
    }

    /// Create an order in DRAFT, or directly in SUBMITTED when `submit` is set
    pub fn create_order(&self, draft: OrderDraft) -> AppResult<Order> {
        if draft.submit && draft.menu_items.is_empty() {
            return Err(AppError::new(ErrorCode::OrderEmpty));
        }

        let pricing = pricing::calculate(
            &draft.menu_items,
            draft.discount_fixed,
            draft.discount_percent,
            draft.delivery_cost,
        )?;

        let txn = self.storage.begin_write()?;
        // The owning client must exist before an order can reference it
        self.storage.load_client(&txn, &draft.client_id)?;

        let now = self.clock.now_millis();
        let mut order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            client_id: draft.client_id,
            coordinator_id: draft.coordinator_id,
            application_id: draft.application_id,
            menu_items: Vec::new(),
            items_total: 0.0,
            discount_fixed: draft.discount_fixed,
            discount_percent: draft.discount_percent,
            discount_amount: 0.0,
            delivery_cost: draft.delivery_cost,
            final_amount: 0.0,
            delivery_date: draft.delivery_date,
            delivery_time: draft.delivery_time,
            delivery_type: draft.delivery_type,
            delivery_address: draft.delivery_address,
            status: if draft.submit {
                OrderStatus::Submitted
            } else {
                OrderStatus::Draft
            },
            payment_status: PaymentStatus::None,
            payment_attempts: 0,
            gateway_order_id: None,
            payment_url: None,
            payment_created_at: None,
            payment_completed_at: None,
            status_comment: None,
            created_at: now,
            updated_at: now,
        };
        order.apply_pricing(pricing);

        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(order_id = %order.id, status = order.status.as_str(), "Order created");
        notify::dispatch_new_order(&self.dispatcher, order.clone());
        Ok(order)
    }

    /// Apply a partial edit to an order.
    ///
    /// Terminal orders are frozen entirely. Once payment has gone through
    /// (PAID or later), commercial terms are locked; fulfillment details
    /// stay editable. Any commercial change recomputes all derived money
    /// fields in the same write.
    pub fn update_order(&self, order_id: &str, patch: OrderPatch) -> AppResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self.storage.load_order(&txn, order_id)?;

        if order.is_terminal() {
            return Err(AppError::order_terminal(order_id));
        }
        if patch.changes_commercial_terms() && order.status.at_or_past_paid() {
            return Err(AppError::with_message(
                ErrorCode::InvalidRequest,
                format!(
                    "Commercial terms are locked once an order is paid (status {})",
                    order.status.as_str()
                ),
            )
            .with_detail("order_id", order_id));
        }

        let commercial_change = patch.changes_commercial_terms();

        if let Some(fixed) = patch.discount_fixed {
            order.discount_fixed = fixed;
        }
        if let Some(percent) = patch.discount_percent {
            order.discount_percent = percent;
        }
        if let Some(delivery_cost) = patch.delivery_cost {
            order.delivery_cost = delivery_cost;
        }
        if let Some(date) = patch.delivery_date {
            order.delivery_date = date;
        }
        if let Some(time) = patch.delivery_time {
            order.delivery_time = time;
        }
        if let Some(delivery_type) = patch.delivery_type {
            order.delivery_type = delivery_type;
        }
        if let Some(address) = patch.delivery_address {
            order.delivery_address = address;
        }

        if commercial_change {
            let items: Vec<LineItemInput> = match patch.menu_items {
                Some(items) => items,
                None => order
                    .menu_items
                    .iter()
                    .map(|item| LineItemInput {
                        id: item.id.clone(),
                        name: item.name.clone(),
                        unit_price: item.unit_price,
                        quantity: item.quantity,
                    })
                    .collect(),
            };
            let pricing = pricing::calculate(
                &items,
                order.discount_fixed,
                order.discount_percent,
                order.delivery_cost,
            )?;
            order.apply_pricing(pricing);
        }

        order.updated_at = self.clock.now_millis();
        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(order_id = %order.id, "Order updated");
        Ok(order)
    }

    /// Apply a manual status change with an optional comment.
    ///
    /// PENDING_PAYMENT and PAID are reserved for the payment orchestrator;
    /// they can never be entered through this path. SUBMITTED to PROCESSING
    /// is the invoice shortcut and is allowed only for corporate clients.
    pub fn update_order_status(
        &self,
        order_id: &str,
        new_status: OrderStatus,
        comment: Option<String>,
    ) -> AppResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self.storage.load_order(&txn, order_id)?;
        let previous = order.status;

        if order.is_terminal() {
            return Err(AppError::order_terminal(order_id));
        }
        if !previous.can_transition_to(new_status) {
            return Err(AppError::illegal_transition(
                previous.as_str(),
                new_status.as_str(),
            ));
        }
        if matches!(
            new_status,
            OrderStatus::PendingPayment | OrderStatus::Paid
        ) {
            return Err(AppError::with_message(
                ErrorCode::PaymentNotAllowed,
                format!(
                    "Status {} is set by the payment flow, not manually",
                    new_status.as_str()
                ),
            )
            .with_detail("order_id", order_id));
        }
        if previous == OrderStatus::Draft
            && new_status == OrderStatus::Submitted
            && order.menu_items.is_empty()
        {
            return Err(AppError::new(ErrorCode::OrderEmpty).with_detail("order_id", order_id));
        }
        if previous == OrderStatus::Submitted && new_status == OrderStatus::Processing {
            let client = self.storage.load_client(&txn, &order.client_id)?;
            if client.category != ClientCategory::Corporate {
                return Err(AppError::illegal_transition(
                    previous.as_str(),
                    new_status.as_str(),
                )
                .with_detail("reason", "invoice shortcut is corporate-only"));
            }
        }

        order.status = new_status;
        order.status_comment = comment;
        order.updated_at = self.clock.now_millis();
        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            order_id = %order.id,
            from = previous.as_str(),
            to = new_status.as_str(),
            "Order status changed"
        );
        notify::dispatch_status_changed(&self.dispatcher, order.clone(), previous);
        Ok(order)
    }

    /// Cancel an order with a reason comment
    pub fn cancel_order(&self, order_id: &str, reason: Option<String>) -> AppResult<Order> {
        self.update_order_status(order_id, OrderStatus::Cancelled, reason)
    }
}
