//! Utility modules: logging and time source

pub mod logger;
pub mod time;

pub use time::{Clock, SystemClock};
