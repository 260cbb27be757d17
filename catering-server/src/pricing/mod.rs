//! Deterministic pricing
//!
//! Totals are always recomputed through [`calculate`] at the mutation site
//! that changed a commercial field and written together with that change.

mod calculator;
mod money;

pub use calculator::calculate;
pub use money::{to_decimal, to_f64, DECIMAL_PLACES, MONEY_TOLERANCE};
