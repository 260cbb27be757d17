//! Inbound applications and their conversion into orders

mod converter;

pub use converter::{ApplicationConverter, ConvertOverrides};
