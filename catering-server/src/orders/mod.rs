//! Order lifecycle service

mod service;

pub use service::{OrderDraft, OrderPatch, OrderService};
