//! Payment orchestration
//!
//! A payment attempt is consumed before the gateway is dialed, in its own
//! committed transaction. A crash or timeout mid-call therefore still counts
//! the attempt, which keeps the MAX_PAYMENT_ATTEMPTS bound honest even when
//! the gateway's answer is lost.
//!
//! Reconciliation is idempotent and monotonic: a charged order stays
//! charged no matter how many times, or in what order, reports arrive.

use crate::db::{EngineStorage, StorageError};
use crate::notify::{self, NotificationDispatcher};
use crate::payments::gateway::{PaymentGateway, SessionRequest};
use crate::pricing::{to_decimal, MONEY_TOLERANCE};
use crate::utils::time::Clock;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{ClientCategory, Order};
use shared::order::{OrderStatus, PaymentOutcome, PaymentStatus, MAX_PAYMENT_ATTEMPTS};
use std::sync::Arc;

/// Payment orchestrator
pub struct PaymentOrchestrator {
    storage: EngineStorage,
    gateway: Arc<dyn PaymentGateway>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    currency: String,
    return_url: String,
}

impl PaymentOrchestrator {
    pub fn new(
        storage: EngineStorage,
        gateway: Arc<dyn PaymentGateway>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        currency: String,
        return_url: String,
    ) -> Self {
        Self {
            storage,
            gateway,
            dispatcher,
            clock,
            currency,
            return_url,
        }
    }

    /// Open a payment session for an order.
    ///
    /// Two transactions bracket the gateway call. The first validates the
    /// preconditions and consumes an attempt; the second, after the gateway
    /// answered, re-validates the order and persists the session. Between
    /// the two, the order may have been cancelled, in which case the session
    /// is dropped and the attempt stays spent.
    pub async fn create_payment(&self, order_id: &str) -> AppResult<Order> {
        // Transaction 1: validate and consume an attempt
        let (order, customer_email) = {
            let txn = self.storage.begin_write()?;
            let mut order = self.storage.load_order(&txn, order_id)?;

            if order.is_terminal() {
                return Err(AppError::order_terminal(order_id));
            }
            if !matches!(
                order.status,
                OrderStatus::Submitted | OrderStatus::PendingPayment
            ) {
                return Err(AppError::with_message(
                    ErrorCode::PaymentNotAllowed,
                    format!(
                        "Payment can only be started from SUBMITTED or PENDING_PAYMENT, order is {}",
                        order.status.as_str()
                    ),
                )
                .with_detail("order_id", order_id));
            }

            let client = self.storage.load_client(&txn, &order.client_id)?;
            if client.category == ClientCategory::Corporate {
                return Err(AppError::corporate_invoice_only().with_detail("order_id", order_id));
            }

            if order.payment_attempts >= MAX_PAYMENT_ATTEMPTS {
                return Err(AppError::attempts_exhausted(order_id));
            }
            order.payment_attempts += 1;
            order.updated_at = self.clock.now_millis();

            self.storage.store_order(&txn, &order)?;
            txn.commit().map_err(StorageError::from)?;
            (order, client.email)
        };

        tracing::info!(
            order_id = %order.id,
            attempt = order.payment_attempts,
            "Opening payment session"
        );

        let session = self
            .gateway
            .create_session(&SessionRequest {
                amount: order.final_amount,
                currency: self.currency.clone(),
                merchant_order_id: order.id.clone(),
                return_url: self.return_url.clone(),
                customer_email,
            })
            .await?;

        // Transaction 2: persist the session against the current state
        let txn = self.storage.begin_write()?;
        let mut order = self.storage.load_order(&txn, order_id)?;
        let previous = order.status;

        if order.is_terminal() {
            tracing::warn!(
                order_id,
                session_id = %session.session_id,
                "Order reached a terminal state during the gateway call, dropping session"
            );
            return Err(AppError::order_terminal(order_id));
        }
        if !previous.can_transition_to(OrderStatus::PendingPayment) {
            return Err(AppError::illegal_transition(
                previous.as_str(),
                OrderStatus::PendingPayment.as_str(),
            ));
        }

        order.status = OrderStatus::PendingPayment;
        order.payment_status = PaymentStatus::Pending;
        order.gateway_order_id = Some(session.session_id);
        order.payment_url = Some(session.payment_url);
        order.payment_created_at = Some(self.clock.now_millis());
        order.updated_at = self.clock.now_millis();

        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        if previous != order.status {
            notify::dispatch_status_changed(&self.dispatcher, order.clone(), previous);
        }
        Ok(order)
    }

    /// Apply a terminal payment outcome to an order.
    ///
    /// Idempotent: once charged, further reports of either kind change
    /// nothing. A FAILED report marks the payment failed but leaves the
    /// order in PENDING_PAYMENT, ready for a retry while attempts remain.
    pub async fn reconcile_payment(
        &self,
        order_id: &str,
        outcome: PaymentOutcome,
    ) -> AppResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self.storage.load_order(&txn, order_id)?;

        if order.payment_status == PaymentStatus::Charged {
            tracing::debug!(order_id, ?outcome, "Payment already charged, report ignored");
            return Ok(order);
        }
        if order.is_terminal() {
            return Err(AppError::order_terminal(order_id));
        }
        // A report is only meaningful against an open session. Without this
        // guard a spurious callback would stamp payment fields onto orders
        // that never entered the payment flow, corporate ones included.
        if order.gateway_order_id.is_none() || order.payment_status == PaymentStatus::None {
            return Err(AppError::with_message(
                ErrorCode::PaymentNotAllowed,
                "Order has no payment session to reconcile",
            )
            .with_detail("order_id", order_id));
        }

        let previous = order.status;
        let mut charged = false;
        match outcome {
            PaymentOutcome::Charged => {
                order.payment_status = PaymentStatus::Charged;
                if order.payment_completed_at.is_none() {
                    order.payment_completed_at = Some(self.clock.now_millis());
                }
                if order.status == OrderStatus::PendingPayment {
                    order.status = OrderStatus::Paid;
                }
                charged = true;
            }
            PaymentOutcome::Failed => {
                order.payment_status = PaymentStatus::Failed;
            }
        }

        order.updated_at = self.clock.now_millis();
        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            order_id = %order.id,
            ?outcome,
            status = order.status.as_str(),
            "Payment reconciled"
        );
        if previous != order.status {
            notify::dispatch_status_changed(&self.dispatcher, order.clone(), previous);
        }
        if charged {
            notify::dispatch_payment_success(&self.dispatcher, order.clone());
        }
        Ok(order)
    }

    /// Handle a raw gateway callback.
    ///
    /// Unknown status strings are rejected without touching the order; the
    /// gateway will retry the callback, or the poll will catch up later.
    pub async fn handle_payment_callback(&self, order_id: &str, raw_status: &str) -> AppResult<Order> {
        let Some(outcome) = PaymentOutcome::parse(raw_status) else {
            tracing::warn!(order_id, raw_status, "Unrecognized gateway payment status");
            return Err(AppError::unknown_gateway_status(raw_status).with_detail("order_id", order_id));
        };
        self.reconcile_payment(order_id, outcome).await
    }

    /// Poll the gateway for the current session status and reconcile.
    ///
    /// Non-terminal gateway states ("PENDING" and friends) leave the order
    /// untouched.
    pub async fn poll_payment(&self, order_id: &str) -> AppResult<Order> {
        let order = self.storage.get_order(order_id)?;
        let Some(session_id) = order.gateway_order_id.clone() else {
            return Err(AppError::with_message(
                ErrorCode::PaymentNotAllowed,
                "Order has no payment session to poll",
            )
            .with_detail("order_id", order_id));
        };

        let status = self.gateway.check_status(&session_id).await?;
        match PaymentOutcome::parse(&status.payment_status) {
            Some(PaymentOutcome::Charged) => {
                // A charged amount that disagrees with the order total is not
                // settled; it needs a human, not a silent write.
                if let Some(amount) = status.amount_charged {
                    let diff = (to_decimal(amount) - to_decimal(order.final_amount)).abs();
                    if diff > MONEY_TOLERANCE {
                        tracing::error!(
                            order_id,
                            charged = amount,
                            expected = order.final_amount,
                            "Gateway charged amount does not match the order total"
                        );
                        return Err(AppError::with_message(
                            ErrorCode::PaymentFailed,
                            "Gateway charged amount does not match the order total",
                        )
                        .with_detail("order_id", order_id)
                        .with_detail("amount_charged", amount)
                        .with_detail("final_amount", order.final_amount));
                    }
                }
                self.reconcile_payment(order_id, PaymentOutcome::Charged).await
            }
            Some(outcome) => self.reconcile_payment(order_id, outcome).await,
            None => {
                tracing::debug!(
                    order_id,
                    status = %status.payment_status,
                    "Payment session not settled yet"
                );
                Ok(order)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::LogDispatcher;
    use crate::payments::gateway::{GatewayError, SessionResponse, StatusResponse};
    use crate::test_support::{sample_client, sample_date, sample_order};
    use crate::utils::time::FixedClock;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Gateway that always issues a session
    struct MockGateway {
        calls: AtomicU32,
        status: String,
        amount_charged: Option<f64>,
    }

    impl MockGateway {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
                status: "PENDING".to_string(),
                amount_charged: None,
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for MockGateway {
        async fn create_session(
            &self,
            request: &SessionRequest,
        ) -> Result<SessionResponse, GatewayError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(SessionResponse {
                session_id: format!("sess-{}-{}", request.merchant_order_id, n),
                payment_url: format!("https://pay.example/s/{}", n),
            })
        }

        async fn check_status(&self, _session_id: &str) -> Result<StatusResponse, GatewayError> {
            Ok(StatusResponse {
                payment_status: self.status.clone(),
                amount_charged: self.amount_charged,
            })
        }
    }

    /// Gateway that always fails at the transport level
    struct FailingGateway;

    #[async_trait]
    impl PaymentGateway for FailingGateway {
        async fn create_session(
            &self,
            _request: &SessionRequest,
        ) -> Result<SessionResponse, GatewayError> {
            Err(GatewayError::Transport("connection refused".to_string()))
        }

        async fn check_status(&self, _session_id: &str) -> Result<StatusResponse, GatewayError> {
            Err(GatewayError::Transport("connection refused".to_string()))
        }
    }

    fn orchestrator_with(gateway: Arc<dyn PaymentGateway>) -> PaymentOrchestrator {
        let storage = EngineStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage
            .insert_client(&txn, &sample_client("client-1", "eva@example.com", false))
            .unwrap();
        storage
            .insert_client(&txn, &sample_client("corp-1", "corp@example.com", true))
            .unwrap();
        txn.commit().unwrap();
        PaymentOrchestrator::new(
            storage,
            gateway,
            Arc::new(LogDispatcher),
            Arc::new(FixedClock::on(sample_date())),
            "EUR".to_string(),
            "https://shop.example/return".to_string(),
        )
    }

    fn seed_order(orchestrator: &PaymentOrchestrator, id: &str, status: OrderStatus) {
        let txn = orchestrator.storage.begin_write().unwrap();
        orchestrator
            .storage
            .store_order(&txn, &sample_order(id, status))
            .unwrap();
        txn.commit().unwrap();
    }

    #[tokio::test]
    async fn test_create_payment_opens_session() {
        let orchestrator = orchestrator_with(Arc::new(MockGateway::new()));
        seed_order(&orchestrator, "o1", OrderStatus::Submitted);

        let order = orchestrator.create_payment("o1").await.unwrap();
        assert_eq!(order.status, OrderStatus::PendingPayment);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.payment_attempts, 1);
        assert!(order.gateway_order_id.is_some());
        assert!(order.payment_url.is_some());
        assert!(order.payment_created_at.is_some());
    }

    #[tokio::test]
    async fn test_retry_replaces_session() {
        let orchestrator = orchestrator_with(Arc::new(MockGateway::new()));
        seed_order(&orchestrator, "o1", OrderStatus::Submitted);

        let first = orchestrator.create_payment("o1").await.unwrap();
        let second = orchestrator.create_payment("o1").await.unwrap();
        assert_eq!(second.status, OrderStatus::PendingPayment);
        assert_eq!(second.payment_attempts, 2);
        assert_ne!(first.gateway_order_id, second.gateway_order_id);
    }

    #[tokio::test]
    async fn test_attempts_capped_at_three() {
        let orchestrator = orchestrator_with(Arc::new(MockGateway::new()));
        seed_order(&orchestrator, "o1", OrderStatus::Submitted);

        for _ in 0..3 {
            orchestrator.create_payment("o1").await.unwrap();
        }
        let err = orchestrator.create_payment("o1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentAttemptsExhausted);
    }

    #[tokio::test]
    async fn test_failed_gateway_call_still_consumes_attempt() {
        let orchestrator = orchestrator_with(Arc::new(FailingGateway));
        seed_order(&orchestrator, "o1", OrderStatus::Submitted);

        let err = orchestrator.create_payment("o1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::GatewayUnavailable);

        let order = orchestrator.storage.get_order("o1").unwrap();
        assert_eq!(order.payment_attempts, 1);
        // Status untouched, no session persisted
        assert_eq!(order.status, OrderStatus::Submitted);
        assert!(order.gateway_order_id.is_none());
    }

    #[tokio::test]
    async fn test_corporate_client_refused() {
        let orchestrator = orchestrator_with(Arc::new(MockGateway::new()));
        let txn = orchestrator.storage.begin_write().unwrap();
        let mut order = sample_order("o1", OrderStatus::Submitted);
        order.client_id = "corp-1".to_string();
        orchestrator.storage.store_order(&txn, &order).unwrap();
        txn.commit().unwrap();

        let err = orchestrator.create_payment("o1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CorporateInvoiceOnly);

        // No attempt is spent on a refused precondition
        let order = orchestrator.storage.get_order("o1").unwrap();
        assert_eq!(order.payment_attempts, 0);
    }

    #[tokio::test]
    async fn test_payment_refused_from_wrong_status() {
        let orchestrator = orchestrator_with(Arc::new(MockGateway::new()));
        for (id, status) in [
            ("draft", OrderStatus::Draft),
            ("paid", OrderStatus::Paid),
            ("processing", OrderStatus::Processing),
        ] {
            seed_order(&orchestrator, id, status);
            let err = orchestrator.create_payment(id).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::PaymentNotAllowed, "{}", id);
        }

        seed_order(&orchestrator, "done", OrderStatus::Completed);
        let err = orchestrator.create_payment("done").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderTerminal);
    }

    #[tokio::test]
    async fn test_charged_outcome_cascades_to_paid() {
        let orchestrator = orchestrator_with(Arc::new(MockGateway::new()));
        seed_order(&orchestrator, "o1", OrderStatus::Submitted);
        orchestrator.create_payment("o1").await.unwrap();

        let order = orchestrator
            .reconcile_payment("o1", PaymentOutcome::Charged)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_status, PaymentStatus::Charged);
        assert!(order.payment_completed_at.is_some());
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent_and_monotonic() {
        let orchestrator = orchestrator_with(Arc::new(MockGateway::new()));
        seed_order(&orchestrator, "o1", OrderStatus::Submitted);
        orchestrator.create_payment("o1").await.unwrap();

        let first = orchestrator
            .reconcile_payment("o1", PaymentOutcome::Charged)
            .await
            .unwrap();

        // Duplicate CHARGED and a late FAILED both change nothing
        let again = orchestrator
            .reconcile_payment("o1", PaymentOutcome::Charged)
            .await
            .unwrap();
        assert_eq!(again, first);
        let late_failure = orchestrator
            .reconcile_payment("o1", PaymentOutcome::Failed)
            .await
            .unwrap();
        assert_eq!(late_failure, first);
        assert_eq!(late_failure.payment_completed_at, first.payment_completed_at);
    }

    #[tokio::test]
    async fn test_failed_outcome_keeps_order_retryable() {
        let orchestrator = orchestrator_with(Arc::new(MockGateway::new()));
        seed_order(&orchestrator, "o1", OrderStatus::Submitted);
        orchestrator.create_payment("o1").await.unwrap();

        let order = orchestrator
            .reconcile_payment("o1", PaymentOutcome::Failed)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::PendingPayment);
        assert_eq!(order.payment_status, PaymentStatus::Failed);

        // A retry is still possible while attempts remain
        let retried = orchestrator.create_payment("o1").await.unwrap();
        assert_eq!(retried.payment_attempts, 2);
        assert_eq!(retried.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_callback_with_unknown_status() {
        let orchestrator = orchestrator_with(Arc::new(MockGateway::new()));
        seed_order(&orchestrator, "o1", OrderStatus::Submitted);
        orchestrator.create_payment("o1").await.unwrap();

        let err = orchestrator
            .handle_payment_callback("o1", "REFUNDED")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownGatewayStatus);

        // Order untouched
        let order = orchestrator.storage.get_order("o1").unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_callback_with_terminal_status() {
        let orchestrator = orchestrator_with(Arc::new(MockGateway::new()));
        seed_order(&orchestrator, "o1", OrderStatus::Submitted);
        orchestrator.create_payment("o1").await.unwrap();

        let order = orchestrator
            .handle_payment_callback("o1", " charged ")
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_poll_ignores_unsettled_session() {
        let orchestrator = orchestrator_with(Arc::new(MockGateway::new()));
        seed_order(&orchestrator, "o1", OrderStatus::Submitted);
        orchestrator.create_payment("o1").await.unwrap();

        // Mock reports PENDING; nothing changes
        let order = orchestrator.poll_payment("o1").await.unwrap();
        assert_eq!(order.status, OrderStatus::PendingPayment);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_poll_settles_charged_session() {
        let mut gateway = MockGateway::new();
        gateway.status = "CHARGED".to_string();
        let orchestrator = orchestrator_with(Arc::new(gateway));
        seed_order(&orchestrator, "o1", OrderStatus::Submitted);
        orchestrator.create_payment("o1").await.unwrap();

        let order = orchestrator.poll_payment("o1").await.unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_status, PaymentStatus::Charged);
    }

    #[tokio::test]
    async fn test_reconcile_without_session_refused() {
        let orchestrator = orchestrator_with(Arc::new(MockGateway::new()));
        seed_order(&orchestrator, "o1", OrderStatus::Submitted);

        let err = orchestrator
            .reconcile_payment("o1", PaymentOutcome::Charged)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentNotAllowed);

        let order = orchestrator.storage.get_order("o1").unwrap();
        assert_eq!(order.payment_status, PaymentStatus::None);
        assert!(order.payment_completed_at.is_none());
    }

    #[tokio::test]
    async fn test_corporate_order_keeps_payment_status_none() {
        // A stray gateway callback must never stamp payment fields onto an
        // invoice-billed order that never opened a session
        let orchestrator = orchestrator_with(Arc::new(MockGateway::new()));
        let txn = orchestrator.storage.begin_write().unwrap();
        let mut order = sample_order("o1", OrderStatus::Submitted);
        order.client_id = "corp-1".to_string();
        orchestrator.storage.store_order(&txn, &order).unwrap();
        txn.commit().unwrap();

        for raw in ["FAILED", "CHARGED"] {
            let err = orchestrator
                .handle_payment_callback("o1", raw)
                .await
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::PaymentNotAllowed, "{}", raw);
        }

        let order = orchestrator.storage.get_order("o1").unwrap();
        assert_eq!(order.payment_status, PaymentStatus::None);
        assert_eq!(order.status, OrderStatus::Submitted);
    }

    #[tokio::test]
    async fn test_poll_rejects_mismatched_charge_amount() {
        let mut gateway = MockGateway::new();
        gateway.status = "CHARGED".to_string();
        gateway.amount_charged = Some(10.00); // order total is 34.00
        let orchestrator = orchestrator_with(Arc::new(gateway));
        seed_order(&orchestrator, "o1", OrderStatus::Submitted);
        orchestrator.create_payment("o1").await.unwrap();

        let err = orchestrator.poll_payment("o1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentFailed);

        // Not settled
        let order = orchestrator.storage.get_order("o1").unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.status, OrderStatus::PendingPayment);
    }

    #[tokio::test]
    async fn test_poll_accepts_matching_charge_amount() {
        let mut gateway = MockGateway::new();
        gateway.status = "CHARGED".to_string();
        gateway.amount_charged = Some(34.00);
        let orchestrator = orchestrator_with(Arc::new(gateway));
        seed_order(&orchestrator, "o1", OrderStatus::Submitted);
        orchestrator.create_payment("o1").await.unwrap();

        let order = orchestrator.poll_payment("o1").await.unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Charged);
        assert_eq!(order.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_reconcile_cancelled_order_refused() {
        let orchestrator = orchestrator_with(Arc::new(MockGateway::new()));
        seed_order(&orchestrator, "o1", OrderStatus::Cancelled);

        let err = orchestrator
            .reconcile_payment("o1", PaymentOutcome::Charged)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderTerminal);
    }
}
