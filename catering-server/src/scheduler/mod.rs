//! Daily status sweep
//!
//! Moves paid orders into PROCESSING two days before delivery and closes
//! out orders on their delivery day. Each order is advanced in its own
//! write transaction; one bad record never blocks the rest of the sweep.

use crate::db::{EngineStorage, StorageError};
use crate::notify::{self, NotificationDispatcher};
use crate::utils::time::{duration_until_next_run, Clock};
use chrono::{Duration, NaiveTime};
use shared::error::AppResult;
use shared::order::OrderStatus;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Days before delivery at which a paid order enters preparation
const PREPARATION_LEAD_DAYS: i64 = 2;

/// Counters from one sweep run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Orders moved into PROCESSING
    pub processing_count: u32,
    /// Orders moved into COMPLETED
    pub completed_count: u32,
}

/// The sweep itself, separated from the scheduling loop so tests can run
/// it directly against a fixed clock
pub struct StatusSweep {
    storage: EngineStorage,
    dispatcher: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
}

impl StatusSweep {
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

    /// Run one full sweep over all open orders
    pub fn run_sweep(&self) -> AppResult<SweepOutcome> {
        let today = self.clock.today();
        let ids = self.storage.list_open_order_ids()?;
        tracing::info!(open_orders = ids.len(), %today, "Status sweep started");

        let mut outcome = SweepOutcome::default();
        for order_id in &ids {
            match self.sweep_order(order_id) {
                Ok(sweep) => {
                    outcome.processing_count += sweep.processing_count;
                    outcome.completed_count += sweep.completed_count;
                }
                Err(err) => {
                    tracing::error!(order_id, error = %err, "Sweep failed for order, continuing");
                }
            }
        }

        tracing::info!(
            processing = outcome.processing_count,
            completed = outcome.completed_count,
            "Status sweep finished"
        );
        Ok(outcome)
    }

    /// Advance a single order as far as today's date warrants.
    ///
    /// On delivery day a PAID order steps through PROCESSING to COMPLETED
    /// within the same transaction; every individual step stays a legal
    /// transition.
    fn sweep_order(&self, order_id: &str) -> AppResult<SweepOutcome> {
        let today = self.clock.today();
        let txn = self.storage.begin_write()?;
        let mut order = self.storage.load_order(&txn, order_id)?;
        let previous = order.status;
        let mut outcome = SweepOutcome::default();

        if order.status == OrderStatus::Paid
            && order.delivery_date <= today + Duration::days(PREPARATION_LEAD_DAYS)
        {
            order.status = OrderStatus::Processing;
            outcome.processing_count += 1;
        }
        if order.status == OrderStatus::Processing && order.delivery_date <= today {
            order.status = OrderStatus::Completed;
            outcome.completed_count += 1;
        }

        if order.status == previous {
            return Ok(outcome);
        }

        order.updated_at = self.clock.now_millis();
        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            order_id = %order.id,
            from = previous.as_str(),
            to = order.status.as_str(),
            "Sweep advanced order"
        );
        notify::dispatch_status_changed(&self.dispatcher, order, previous);
        Ok(outcome)
    }
}

/// Daily scheduler around [`StatusSweep`]
pub struct SweepScheduler {
    sweep: Arc<StatusSweep>,
    run_time: NaiveTime,
    cancel: CancellationToken,
}

impl SweepScheduler {
    pub fn new(sweep: StatusSweep, sweep_hour: u32, cancel: CancellationToken) -> Self {
        let run_time = NaiveTime::from_hms_opt(sweep_hour, 0, 0)
            .unwrap_or_else(|| NaiveTime::from_hms_opt(6, 0, 0).unwrap());
        Self {
            sweep: Arc::new(sweep),
            run_time,
            cancel,
        }
    }

    /// Run until cancelled, sweeping once per day at the configured hour
    pub async fn run(self) {
        tracing::info!(run_time = %self.run_time, "Sweep scheduler started");
        loop {
            let wait = duration_until_next_run(self.run_time);
            tracing::debug!(seconds = wait.as_secs(), "Next sweep scheduled");

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("Sweep scheduler stopped");
                    return;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            let sweep = self.sweep.clone();
            let result = tokio::task::spawn_blocking(move || sweep.run_sweep()).await;
            match result {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => tracing::error!(error = %err, "Status sweep failed"),
                Err(err) => tracing::error!(error = %err, "Status sweep task panicked"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::LogDispatcher;
    use crate::test_support::sample_order;
    use crate::utils::time::FixedClock;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn sweep() -> StatusSweep {
        StatusSweep::new(
            EngineStorage::open_in_memory().unwrap(),
            Arc::new(LogDispatcher),
            Arc::new(FixedClock::on(today())),
        )
    }

    fn seed(sweep: &StatusSweep, id: &str, status: OrderStatus, delivery: NaiveDate) {
        let txn = sweep.storage.begin_write().unwrap();
        let mut order = sample_order(id, status);
        order.delivery_date = delivery;
        sweep.storage.store_order(&txn, &order).unwrap();
        txn.commit().unwrap();
    }

    #[tokio::test]
    async fn test_paid_enters_processing_two_days_out() {
        let sweep = sweep();
        seed(&sweep, "o1", OrderStatus::Paid, today() + Duration::days(2));

        let outcome = sweep.run_sweep().unwrap();
        assert_eq!(outcome.processing_count, 1);
        assert_eq!(outcome.completed_count, 0);
        assert_eq!(
            sweep.storage.get_order("o1").unwrap().status,
            OrderStatus::Processing
        );
    }

    #[tokio::test]
    async fn test_far_future_order_untouched() {
        let sweep = sweep();
        seed(&sweep, "o1", OrderStatus::Paid, today() + Duration::days(3));

        let outcome = sweep.run_sweep().unwrap();
        assert_eq!(outcome, SweepOutcome::default());
        assert_eq!(
            sweep.storage.get_order("o1").unwrap().status,
            OrderStatus::Paid
        );
    }

    #[tokio::test]
    async fn test_processing_completes_on_delivery_day() {
        let sweep = sweep();
        seed(&sweep, "o1", OrderStatus::Processing, today());

        let outcome = sweep.run_sweep().unwrap();
        assert_eq!(outcome.completed_count, 1);
        assert_eq!(
            sweep.storage.get_order("o1").unwrap().status,
            OrderStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_paid_steps_to_completed_on_delivery_day() {
        // A paid order whose delivery day arrived without passing through
        // a T-2 sweep must still close out, stepping through PROCESSING
        let sweep = sweep();
        seed(&sweep, "o1", OrderStatus::Paid, today());

        let outcome = sweep.run_sweep().unwrap();
        assert_eq!(outcome.processing_count, 1);
        assert_eq!(outcome.completed_count, 1);
        assert_eq!(
            sweep.storage.get_order("o1").unwrap().status,
            OrderStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_overdue_delivery_date_also_completes() {
        let sweep = sweep();
        seed(&sweep, "o1", OrderStatus::Paid, today() - Duration::days(1));

        sweep.run_sweep().unwrap();
        assert_eq!(
            sweep.storage.get_order("o1").unwrap().status,
            OrderStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_unpaid_orders_never_advanced() {
        let sweep = sweep();
        for (id, status) in [
            ("draft", OrderStatus::Draft),
            ("submitted", OrderStatus::Submitted),
            ("pending", OrderStatus::PendingPayment),
        ] {
            seed(&sweep, id, status, today());
        }

        let outcome = sweep.run_sweep().unwrap();
        assert_eq!(outcome, SweepOutcome::default());
        for (id, status) in [
            ("draft", OrderStatus::Draft),
            ("submitted", OrderStatus::Submitted),
            ("pending", OrderStatus::PendingPayment),
        ] {
            assert_eq!(sweep.storage.get_order(id).unwrap().status, status, "{}", id);
        }
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() {
        let sweep = sweep();
        seed(&sweep, "o1", OrderStatus::Paid, today() + Duration::days(2));
        seed(&sweep, "o2", OrderStatus::Processing, today());

        let first = sweep.run_sweep().unwrap();
        assert_eq!(first.processing_count, 1);
        assert_eq!(first.completed_count, 1);

        // Second run finds nothing left to do
        let second = sweep.run_sweep().unwrap();
        assert_eq!(second, SweepOutcome::default());
    }

    #[tokio::test]
    async fn test_terminal_orders_skipped() {
        let sweep = sweep();
        seed(&sweep, "done", OrderStatus::Completed, today());
        seed(&sweep, "gone", OrderStatus::Cancelled, today());

        let outcome = sweep.run_sweep().unwrap();
        assert_eq!(outcome, SweepOutcome::default());
        assert_eq!(
            sweep.storage.get_order("gone").unwrap().status,
            OrderStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_scheduler_stops_on_cancel() {
        let sweep = sweep();
        let cancel = CancellationToken::new();
        let scheduler = SweepScheduler::new(sweep, 6, cancel.clone());

        let handle = tokio::spawn(scheduler.run());
        cancel.cancel();
        handle.await.unwrap();
    }
}
