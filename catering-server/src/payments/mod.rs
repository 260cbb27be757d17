//! Payment session creation and reconciliation

mod gateway;
mod orchestrator;

pub use gateway::{
    GatewayError, HttpPaymentGateway, PaymentGateway, SessionRequest, SessionResponse,
    StatusResponse,
};
pub use orchestrator::PaymentOrchestrator;
