/// Engine configuration
///
/// # Environment variables
///
/// All settings can be overridden through environment variables:
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | WORK_DIR | /var/lib/catering | Working directory (database, logs) |
/// | GATEWAY_URL | http://localhost:3002 | Payment gateway base URL |
/// | GATEWAY_TIMEOUT_MS | 10000 | Gateway request timeout (milliseconds) |
/// | PAYMENT_RETURN_URL | http://localhost:3000/payment/return | Where the gateway sends the payer back |
/// | CURRENCY | EUR | Currency code passed to the gateway |
/// | SWEEP_HOUR | 6 | Hour of day (UTC, 0-23) for the status sweep |
/// | ENVIRONMENT | development | development \| staging \| production |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/catering SWEEP_HOUR=5 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the database and log files
    pub work_dir: String,
    /// Payment gateway base URL
    pub gateway_url: String,
    /// Gateway request timeout in milliseconds
    pub gateway_timeout_ms: u64,
    /// Return URL handed to the gateway when opening a session
    pub payment_return_url: String,
    /// Currency code passed verbatim to the gateway
    pub currency: String,
    /// Hour of day (UTC) at which the daily status sweep runs
    pub sweep_hour: u32,
    /// Runtime environment: development | staging | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/catering".into()),
            gateway_url: std::env::var("GATEWAY_URL")
                .unwrap_or_else(|_| "http://localhost:3002".into()),
            gateway_timeout_ms: std::env::var("GATEWAY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            payment_return_url: std::env::var("PAYMENT_RETURN_URL")
                .unwrap_or_else(|_| "http://localhost:3000/payment/return".into()),
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "EUR".into()),
            sweep_hour: std::env::var("SWEEP_HOUR")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|h| *h < 24)
                .unwrap_or(6),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: "/var/lib/catering".into(),
            gateway_url: "http://localhost:3002".into(),
            gateway_timeout_ms: 10_000,
            payment_return_url: "http://localhost:3000/payment/return".into(),
            currency: "EUR".into(),
            sweep_hour: 6,
            environment: "development".into(),
        }
    }
}
