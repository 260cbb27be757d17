use catering_server::{
    Clock, Config, EngineStorage, HttpPaymentGateway, LogDispatcher, NotificationDispatcher,
    PaymentGateway, PaymentOrchestrator, StatusSweep, SweepScheduler, SystemClock,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, working directory, logging)
    dotenv::dotenv().ok();
    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;

    if config.environment == "production" {
        let log_dir = format!("{}/logs", config.work_dir);
        std::fs::create_dir_all(&log_dir)?;
        catering_server::init_logger_with_file(Some("info"), Some(&log_dir));
    } else {
        catering_server::init_logger();
    }

    tracing::info!(
        environment = %config.environment,
        work_dir = %config.work_dir,
        "Catering server starting"
    );

    // 2. Storage
    let db_path = format!("{}/catering.redb", config.work_dir);
    let storage = EngineStorage::open(&db_path)?;
    tracing::info!(path = %db_path, "Storage opened");

    // 3. Shared services
    let dispatcher: Arc<dyn NotificationDispatcher> = Arc::new(LogDispatcher);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let gateway: Arc<dyn PaymentGateway> = Arc::new(HttpPaymentGateway::new(
        config.gateway_url.clone(),
        Duration::from_millis(config.gateway_timeout_ms),
    )?);
    let orchestrator = Arc::new(PaymentOrchestrator::new(
        storage.clone(),
        gateway,
        dispatcher.clone(),
        clock.clone(),
        config.currency.clone(),
        config.payment_return_url.clone(),
    ));

    // 4. Poll pending payment sessions so missed callbacks settle eventually
    let cancel = CancellationToken::new();
    let poll_handle = tokio::spawn(poll_pending_payments(
        storage.clone(),
        orchestrator.clone(),
        cancel.clone(),
    ));

    // 5. Daily status sweep
    let sweep = StatusSweep::new(storage.clone(), dispatcher.clone(), clock.clone());
    let scheduler = SweepScheduler::new(sweep, config.sweep_hour, cancel.clone());
    let scheduler_handle = tokio::spawn(scheduler.run());

    tracing::info!(sweep_hour = config.sweep_hour, "Engine running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutdown signal received");
    cancel.cancel();
    scheduler_handle.await?;
    poll_handle.await?;
    tracing::info!("Catering server stopped");

    Ok(())
}

/// Interval between gateway status polls for unsettled payment sessions
const PAYMENT_POLL_INTERVAL: Duration = Duration::from_secs(300);

async fn poll_pending_payments(
    storage: EngineStorage,
    orchestrator: Arc<PaymentOrchestrator>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(PAYMENT_POLL_INTERVAL) => {}
        }

        let ids = match storage.list_open_order_ids() {
            Ok(ids) => ids,
            Err(err) => {
                tracing::error!(error = %err, "Payment poll could not list orders");
                continue;
            }
        };

        for order_id in ids {
            let has_session = storage
                .get_order(&order_id)
                .map(|o| {
                    o.status == shared::order::OrderStatus::PendingPayment
                        && o.gateway_order_id.is_some()
                })
                .unwrap_or(false);
            if !has_session {
                continue;
            }
            if let Err(err) = orchestrator.poll_payment(&order_id).await {
                tracing::warn!(order_id = %order_id, error = %err, "Payment poll failed");
            }
        }
    }
}
