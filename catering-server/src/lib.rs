//! Catering Server - order lifecycle and payment reconciliation engine
//!
//! # Architecture overview
//!
//! The engine owns the full lifecycle of a catering order: pricing,
//! submission, online payment, conversion from inbound applications, and
//! the daily sweep that walks paid orders to completion.
//!
//! # Module structure
//!
//! ```text
//! catering-server/src/
//! ├── core/          # Configuration
//! ├── db/            # redb storage layer
//! ├── pricing/       # Deterministic money calculations
//! ├── orders/        # Order lifecycle service
//! ├── payments/      # Gateway client and payment orchestration
//! ├── applications/  # Application-to-order conversion
//! ├── clients/       # Client registry
//! ├── scheduler/     # Daily status sweep
//! ├── notify/        # Notification dispatch seam
//! └── utils/         # Logger, clock
//! ```

pub mod applications;
pub mod clients;
pub mod core;
pub mod db;
pub mod notify;
pub mod orders;
pub mod payments;
pub mod pricing;
pub mod scheduler;
pub mod utils;

#[cfg(test)]
pub mod test_support;

// Re-export public types
pub use applications::{ApplicationConverter, ConvertOverrides};
pub use clients::{ClientRegistry, NewClient};
pub use core::Config;
pub use db::EngineStorage;
pub use notify::{LogDispatcher, NotificationDispatcher};
pub use orders::{OrderDraft, OrderPatch, OrderService};
pub use payments::{HttpPaymentGateway, PaymentGateway, PaymentOrchestrator};
pub use scheduler::{StatusSweep, SweepOutcome, SweepScheduler};
pub use utils::time::{Clock, SystemClock};

// Re-export unified error types from shared
pub use shared::error::{AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
