//! Payment gateway client
//!
//! The engine talks to the gateway through the [`PaymentGateway`] trait;
//! production uses the HTTP implementation, tests substitute mocks. The
//! gateway is treated as unreliable by contract: every call can fail, and
//! callers must already have persisted their side before dialing out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use std::time::Duration;
use thiserror::Error;

/// Request to open a payment session
#[derive(Debug, Clone, Serialize)]
pub struct SessionRequest {
    /// Amount to charge, in currency units
    pub amount: f64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Our order id, echoed back in callbacks
    pub merchant_order_id: String,
    /// Where the gateway sends the customer after payment
    pub return_url: String,
    pub customer_email: String,
}

/// Gateway response to a session request
#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    /// Gateway-side session id
    pub session_id: String,
    /// Hosted payment page for the customer
    pub payment_url: String,
}

/// Gateway response to a status poll
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    /// Raw gateway status string, parsed by the reconciler
    pub payment_status: String,
    pub amount_charged: Option<f64>,
}

/// Gateway call failures
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gateway transport error: {0}")]
    Transport(String),

    #[error("Gateway rejected the request: {0}")]
    Rejected(String),

    #[error("Gateway returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::gateway(err.to_string())
    }
}

/// Payment gateway interface
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a payment session for an order
    async fn create_session(&self, request: &SessionRequest)
        -> Result<SessionResponse, GatewayError>;

    /// Poll the current status of a session
    async fn check_status(&self, session_id: &str) -> Result<StatusResponse, GatewayError>;
}

/// HTTP gateway client
///
/// Retries once on transport-level failures (timeout, connection refused);
/// a rejected or malformed response is never retried.
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPaymentGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn is_retryable(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect()
    }

    async fn post_session(
        &self,
        request: &SessionRequest,
    ) -> Result<SessionResponse, reqwest::Error> {
        self.client
            .post(format!("{}/sessions", self.base_url))
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json::<SessionResponse>()
            .await
    }

    async fn get_status(&self, session_id: &str) -> Result<StatusResponse, reqwest::Error> {
        self.client
            .get(format!("{}/sessions/{}", self.base_url, session_id))
            .send()
            .await?
            .error_for_status()?
            .json::<StatusResponse>()
            .await
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<SessionResponse, GatewayError> {
        match self.post_session(request).await {
            Ok(response) => Ok(response),
            Err(err) if Self::is_retryable(&err) => {
                tracing::warn!(error = %err, "Gateway session request failed, retrying once");
                self.post_session(request)
                    .await
                    .map_err(|e| GatewayError::Transport(e.to_string()))
            }
            Err(err) if err.is_status() => Err(GatewayError::Rejected(err.to_string())),
            Err(err) if err.is_decode() => Err(GatewayError::InvalidResponse(err.to_string())),
            Err(err) => Err(GatewayError::Transport(err.to_string())),
        }
    }

    async fn check_status(&self, session_id: &str) -> Result<StatusResponse, GatewayError> {
        match self.get_status(session_id).await {
            Ok(response) => Ok(response),
            Err(err) if Self::is_retryable(&err) => {
                tracing::warn!(error = %err, "Gateway status poll failed, retrying once");
                self.get_status(session_id)
                    .await
                    .map_err(|e| GatewayError::Transport(e.to_string()))
            }
            Err(err) if err.is_status() => Err(GatewayError::Rejected(err.to_string())),
            Err(err) if err.is_decode() => Err(GatewayError::InvalidResponse(err.to_string())),
            Err(err) => Err(GatewayError::Transport(err.to_string())),
        }
    }
}
