//! Money arithmetic and boundary validation
//!
//! All calculations are done using `Decimal` internally, then converted to
//! `f64` for storage/serialization. Inputs are validated at the boundary;
//! nothing malformed is silently coerced to zero.

use rust_decimal::prelude::*;
use shared::error::{AppError, AppResult};
use shared::order::LineItemInput;

/// Rounding strategy for monetary values (2 decimal places, half-up)
pub const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed unit price per item
const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per item
const MAX_QUANTITY: i32 = 9999;
/// Maximum allowed fixed discount / delivery cost
const MAX_AMOUNT: f64 = 1_000_000.0;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field_name: &str) -> AppResult<()> {
    if !value.is_finite() {
        return Err(AppError::validation(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate a line item before pricing
pub fn validate_line_item(item: &LineItemInput) -> AppResult<()> {
    if item.name.trim().is_empty() {
        return Err(AppError::validation("item name must not be empty")
            .with_detail("item_id", item.id.clone()));
    }

    require_finite(item.unit_price, "unit_price")?;
    if item.unit_price < 0.0 {
        return Err(AppError::validation(format!(
            "unit_price must be non-negative, got {}",
            item.unit_price
        ))
        .with_detail("item_id", item.id.clone()));
    }
    if item.unit_price > MAX_PRICE {
        return Err(AppError::validation(format!(
            "unit_price exceeds maximum allowed ({}), got {}",
            MAX_PRICE, item.unit_price
        ))
        .with_detail("item_id", item.id.clone()));
    }

    if item.quantity <= 0 {
        return Err(AppError::validation(format!(
            "quantity must be positive, got {}",
            item.quantity
        ))
        .with_detail("item_id", item.id.clone()));
    }
    if item.quantity > MAX_QUANTITY {
        return Err(AppError::validation(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, item.quantity
        ))
        .with_detail("item_id", item.id.clone()));
    }

    Ok(())
}

/// Validate the discount pair and delivery cost
pub fn validate_charges(
    discount_fixed: f64,
    discount_percent: f64,
    delivery_cost: f64,
) -> AppResult<()> {
    require_finite(discount_fixed, "discount_fixed")?;
    if !(0.0..=MAX_AMOUNT).contains(&discount_fixed) {
        return Err(AppError::validation(format!(
            "discount_fixed must be between 0 and {}, got {}",
            MAX_AMOUNT, discount_fixed
        )));
    }

    require_finite(discount_percent, "discount_percent")?;
    if !(0.0..=100.0).contains(&discount_percent) {
        return Err(AppError::validation(format!(
            "discount_percent must be between 0 and 100, got {}",
            discount_percent
        )));
    }

    require_finite(delivery_cost, "delivery_cost")?;
    if !(0.0..=MAX_AMOUNT).contains(&delivery_cost) {
        return Err(AppError::validation(format!(
            "delivery_cost must be between 0 and {}, got {}",
            MAX_AMOUNT, delivery_cost
        )));
    }

    Ok(())
}
