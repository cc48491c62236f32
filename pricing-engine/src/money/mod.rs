//! Money calculation utilities using rust_decimal for precision
//!
//! Every rounding in the engines goes through this module so that the
//! rounding regime (half away from zero) and the scales stay in one place:
//! prices and presented tax at the configured price/final scale, per-row tax
//! at the calculation scale, proration weights at `WEIGHT_DECIMALS`.

use rust_decimal::prelude::*;

/// Scale of proration weights
pub const WEIGHT_DECIMALS: u32 = 10;

/// Round half away from zero to `dp` places
#[inline]
pub fn round_money(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// `basis * percent / 100`, unrounded
#[inline]
pub fn percent_of(basis: Decimal, percent: Decimal) -> Decimal {
    basis * percent / Decimal::ONE_HUNDRED
}

/// `value * (1 + rate/100)` rounded to `dp`
pub fn scale_by_rate(value: Decimal, rate: Decimal, dp: u32) -> Decimal {
    round_money(value * (Decimal::ONE + rate / Decimal::ONE_HUNDRED), dp)
}

/// Tax contained in a tax-inclusive unit price: `unit - unit / (1 + rate/100)`
pub fn embedded_tax_per_unit(unit_price: Decimal, rate: Decimal, dp: u32) -> Decimal {
    let divisor = Decimal::ONE + rate / Decimal::ONE_HUNDRED;
    if divisor.is_zero() {
        return Decimal::ZERO;
    }
    round_money(unit_price - unit_price / divisor, dp)
}

/// Share of `part` in `total`; `None` when the total is zero
pub fn proration_weight(part: Decimal, total: Decimal) -> Option<Decimal> {
    if total.is_zero() {
        return None;
    }
    Some(round_money(part / total, WEIGHT_DECIMALS))
}

/// Clamp to `[minimum, maximum]`. The maximum is applied first so that a
/// minimum above the maximum wins. Returns the price and whether the minimum
/// raised it.
pub fn clamp_price(
    price: Decimal,
    minimum: Option<Decimal>,
    maximum: Option<Decimal>,
) -> (Decimal, bool) {
    let mut price = price;
    if let Some(max) = maximum
        && price > max
    {
        price = max;
    }
    match minimum {
        Some(min) if price < min => (min, true),
        _ => (price, false),
    }
}
