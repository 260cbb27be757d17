//! Application to order conversion
//!
//! One write transaction covers the whole conversion: resolve or create the
//! client, build the order, mark the application approved. Either everything
//! lands or nothing does, so an application can never end up approved
//! without its order.

use crate::clients::ClientRegistry;
use crate::db::{EngineStorage, StorageError};
use crate::notify::{self, NotificationDispatcher};
use crate::pricing;
use crate::utils::time::Clock;
use chrono::NaiveDate;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Application, ApplicationStatus, Order, StaffUser};
use shared::order::{DeliveryType, LineItemInput, OrderStatus, PaymentStatus};
use std::sync::Arc;

/// Coordinator adjustments applied during conversion; `None` keeps the
/// value carried on the application
#[derive(Debug, Clone, Default)]
pub struct ConvertOverrides {
    pub menu_items: Option<Vec<LineItemInput>>,
    pub discount_fixed: Option<f64>,
    pub discount_percent: Option<f64>,
    pub delivery_cost: Option<f64>,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: Option<String>,
    pub delivery_type: Option<DeliveryType>,
    pub delivery_address: Option<String>,
}

/// Converts approved-to-be applications into submitted orders
pub struct ApplicationConverter {
    storage: EngineStorage,
    clients: ClientRegistry,
    dispatcher: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
}

impl ApplicationConverter {
    pub fn new(
        storage: EngineStorage,
        dispatcher: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let clients = ClientRegistry::new(storage.clone());
        Self {
            storage,
            clients,
            dispatcher,
            clock,
        }
    }

    /// Fetch an application by id
    pub fn get_application(&self, application_id: &str) -> AppResult<Application> {
        Ok(self.storage.get_application(application_id)?)
    }

    /// Convert an application into a SUBMITTED order.
    ///
    /// Convertible means NEW or PROCESSING with no order yet; anything else
    /// is refused. The applicant is matched to an existing client by id or
    /// email, or a new client account with a temporary credential is created
    /// inside the same transaction.
    pub fn convert(
        &self,
        application_id: &str,
        acting: &StaffUser,
        overrides: ConvertOverrides,
    ) -> AppResult<(Order, Application)> {
        let txn = self.storage.begin_write()?;
        let mut application = self.storage.load_application(&txn, application_id)?;

        if !application.is_convertible() {
            let code = match application.status {
                ApplicationStatus::Rejected => ErrorCode::ApplicationRejected,
                _ => ErrorCode::ApplicationAlreadyConverted,
            };
            return Err(AppError::new(code)
                .with_detail("application_id", application_id)
                .with_detail("status", format!("{:?}", application.status)));
        }

        let client = match &application.client_id {
            Some(client_id) => self.storage.load_client(&txn, client_id)?,
            None => self.clients.resolve_or_create_in_txn(
                &txn,
                &application.contact_name,
                &application.contact_email,
                application.contact_phone.clone(),
            )?,
        };

        let items = overrides
            .menu_items
            .unwrap_or_else(|| application.cart_items.clone());
        if items.is_empty() {
            return Err(AppError::new(ErrorCode::OrderEmpty)
                .with_detail("application_id", application_id));
        }

        let discount_fixed = overrides.discount_fixed.unwrap_or(0.0);
        let discount_percent = overrides.discount_percent.unwrap_or(0.0);
        let delivery_cost = overrides.delivery_cost.unwrap_or(0.0);
        let pricing = pricing::calculate(&items, discount_fixed, discount_percent, delivery_cost)?;

        let now = self.clock.now_millis();
        let mut order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            client_id: client.id.clone(),
            coordinator_id: Some(acting.id.clone()),
            application_id: Some(application.id.clone()),
            menu_items: Vec::new(),
            items_total: 0.0,
            discount_fixed,
            discount_percent,
            discount_amount: 0.0,
            delivery_cost,
            final_amount: 0.0,
            delivery_date: overrides.delivery_date.unwrap_or(application.event_date),
            delivery_time: overrides
                .delivery_time
                .or_else(|| application.event_time.clone()),
            delivery_type: overrides.delivery_type.unwrap_or_default(),
            delivery_address: overrides
                .delivery_address
                .or_else(|| application.event_address.clone()),
            status: OrderStatus::Submitted,
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

        application.status = ApplicationStatus::Approved;
        application.client_id = Some(client.id);
        application.coordinator_id = Some(acting.id.clone());
        application.processed_at = Some(now);
        application.order_id = Some(order.id.clone());
        self.storage.store_application(&txn, &application)?;

        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            application_id = %application.id,
            order_id = %order.id,
            coordinator = %acting.id,
            "Application converted to order"
        );
        notify::dispatch_new_order(&self.dispatcher, order.clone());
        Ok((order, application))
    }
}
