use crate::types::Price;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Prices are quoted in cents: two decimal places.
const PRICE_SCALE: u32 = 2;

/// Converts a decimal price to minor units (cents).
///
/// Multiplies by 100 and rounds half-up to the nearest integer, so
/// `100.005` becomes `10001`. Returns `None` if the result does not fit.
pub fn price_to_minor_units(price: Decimal) -> Option<Price> {
    (price * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Converts a minor-units price back to its decimal form.
pub fn price_from_minor_units(price: Price) -> Decimal {
    Decimal::new(price, PRICE_SCALE)
}

/// Formats a minor-units price for display, e.g. `10050` -> `"100.50"`.
pub fn format_price(price: Price) -> String {
    price_from_minor_units(price).to_string()
}

/// Formats a midpoint (minor units, possibly ending in a half cent) for
/// display, e.g. `10050.5` -> `"100.505"`.
pub fn format_mid(mid: Decimal) -> String {
    (mid / Decimal::ONE_HUNDRED).to_string()
}
