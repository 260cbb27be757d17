//! Order lifecycle types shared across the engine

mod types;

pub use types::{
    DeliveryType, LineItem, LineItemInput, OrderStatus, PaymentOutcome, PaymentStatus, Pricing,
    MAX_PAYMENT_ATTEMPTS,
};
