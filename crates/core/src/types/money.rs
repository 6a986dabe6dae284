//! Money arithmetic on `rust_decimal::Decimal`.
//!
//! Prices and totals keep full decimal precision internally. Rounding to
//! cents happens once, when a receipt is issued.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round an amount to two decimal places, halves away from zero.
///
/// ```
/// use corner_shop_core::round_to_cents;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_to_cents(Decimal::new(10_005, 3)), Decimal::new(1_001, 2));
/// ```
#[must_use]
pub fn round_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Multiply a unit price by a quantity, saturating at `Decimal::MAX`.
#[must_use]
pub fn line_total(unit_price: Decimal, qty: u32) -> Decimal {
    unit_price.saturating_mul(Decimal::from(qty))
}
