//! Shared types for the catering order engine
//!
//! Domain types used across the workspace: order lifecycle enums and line
//! items, persisted entity models, the unified error stack, and small
//! utilities.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};
