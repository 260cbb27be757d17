//! Persisted entity models

pub mod application;
pub mod order;
pub mod user;

pub use application::{Application, ApplicationStatus};
pub use order::Order;
pub use user::{ClientAccount, ClientCategory, StaffRole, StaffUser, User};
