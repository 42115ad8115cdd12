//! Money helpers.
//!
//! Amounts are stored as `f64` currency units; everything that lands in the
//! database goes through `round_money` first so totals compare exactly.

use crate::models::DiscountType;

pub fn round_money(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

pub fn line_total(unit_price: f64, quantity: i64) -> f64 {
    round_money(unit_price * quantity as f64)
}

/// Discount amount for a subtotal, clamped to `[0, subtotal]`.
pub fn apply_discount(subtotal: f64, discount_type: DiscountType, value: f64) -> f64 {
    let raw = match discount_type {
        DiscountType::Percentage => subtotal * value / 100.0,
        DiscountType::FixedAmount => value,
    };
    round_money(raw.clamp(0.0, subtotal.max(0.0)))
}

/// Period-over-period change for dashboard cards, one decimal place.
///
/// A zero baseline reports 100% growth when anything happened and 0%
/// otherwise, rather than dividing by zero.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return if current > 0.0 { 100.0 } else { 0.0 };
    }
    (((current - previous) / previous) * 1000.0).round() / 10.0
}

pub fn average(total: f64, count: i64) -> f64 {
    if count <= 0 {
        0.0
    } else {
        round_money(total / count as f64)
    }
}
