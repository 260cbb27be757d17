//! Notification dispatch seam
//!
//! Content and transport (email, SMS) live outside the engine. The engine
//! only announces state changes, and always after the storage commit:
//! dispatch is spawn-and-forget, so a broken dispatcher can never roll back
//! or block the order mutation that triggered it.

use async_trait::async_trait;
use shared::models::Order;
use shared::order::OrderStatus;
use std::sync::Arc;

/// Receiver of engine state-change announcements
///
/// Implementations must handle their own failures; nothing is propagated
/// back into the engine.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn on_new_order(&self, order: &Order);

    async fn on_order_status_changed(&self, order: &Order, previous: OrderStatus);

    async fn on_payment_success(&self, order: &Order);
}

/// Default dispatcher that only writes structured log lines
#[derive(Debug, Default)]
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn on_new_order(&self, order: &Order) {
        tracing::info!(order_id = %order.id, client_id = %order.client_id, "New order created");
    }

    async fn on_order_status_changed(&self, order: &Order, previous: OrderStatus) {
        tracing::info!(
            order_id = %order.id,
            from = previous.as_str(),
            to = order.status.as_str(),
            "Order status changed"
        );
    }

    async fn on_payment_success(&self, order: &Order) {
        tracing::info!(
            order_id = %order.id,
            amount = order.final_amount,
            "Payment completed"
        );
    }
}

/// Fire-and-forget dispatch helpers. Each spawns a task that owns a clone of
/// the order, so callers return immediately after their commit.
pub fn dispatch_new_order(dispatcher: &Arc<dyn NotificationDispatcher>, order: Order) {
    let dispatcher = dispatcher.clone();
    tokio::spawn(async move {
        dispatcher.on_new_order(&order).await;
    });
}

pub fn dispatch_status_changed(
    dispatcher: &Arc<dyn NotificationDispatcher>,
    order: Order,
    previous: OrderStatus,
) {
    let dispatcher = dispatcher.clone();
    tokio::spawn(async move {
        dispatcher.on_order_status_changed(&order, previous).await;
    });
}

pub fn dispatch_payment_success(dispatcher: &Arc<dyn NotificationDispatcher>, order: Order) {
    let dispatcher = dispatcher.clone();
    tokio::spawn(async move {
        dispatcher.on_payment_success(&order).await;
    });
}
