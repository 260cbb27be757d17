//! Pricing calculator
//!
//! Pure and deterministic: identical inputs always yield identical outputs,
//! so every edit can safely re-run it and the derived money fields stay
//! auditable instead of hidden behind computed getters.

use super::money::{self, to_decimal, to_f64};
use rust_decimal::Decimal;
use shared::error::AppResult;
use shared::order::{LineItem, LineItemInput, Pricing};

/// Compute the full pricing breakdown for a set of line items.
///
/// - `items_total` = Σ(unit_price × quantity), each line rounded to currency
///   precision before summing
/// - `discount_amount` = min(items_total, discount_fixed + items_total ×
///   discount_percent / 100); a discount never drives the subtotal negative
/// - `final_amount` = max(0, items_total − discount_amount) + delivery_cost;
///   delivery cost is never discounted
pub fn calculate(
    items: &[LineItemInput],
    discount_fixed: f64,
    discount_percent: f64,
    delivery_cost: f64,
) -> AppResult<Pricing> {
    money::validate_charges(discount_fixed, discount_percent, delivery_cost)?;

    let mut items_total = Decimal::ZERO;
    let mut resolved_items = Vec::with_capacity(items.len());

    for item in items {
        money::validate_line_item(item)?;

        let line_total =
            to_decimal(item.unit_price) * Decimal::from(item.quantity);
        let line_total = to_decimal(to_f64(line_total));
        items_total += line_total;

        resolved_items.push(LineItem {
            id: item.id.clone(),
            name: item.name.clone(),
            unit_price: to_f64(to_decimal(item.unit_price)),
            quantity: item.quantity,
            line_total: to_f64(line_total),
        });
    }

    let raw_discount = to_decimal(discount_fixed)
        + items_total * to_decimal(discount_percent) / Decimal::ONE_HUNDRED;
    // Round before subtracting so the stored discount is exactly what was applied
    let discount = to_decimal(to_f64(raw_discount.min(items_total).max(Decimal::ZERO)));

    let subtotal = (items_total - discount).max(Decimal::ZERO);
    let final_amount = subtotal + to_decimal(delivery_cost);

    Ok(Pricing {
        items_total: to_f64(items_total),
        discount_amount: to_f64(discount),
        final_amount: to_f64(final_amount),
        resolved_items,
    })
}
