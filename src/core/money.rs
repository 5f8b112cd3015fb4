//! Money helpers.
//!
//! Amounts are `Decimal` everywhere in the business logic and integer minor units
//! (cents, paisa, ...) in the database. These functions are the only crossing point.

use crate::errors::{Error, Result};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

/// Number of decimal places kept for stored amounts.
pub const MONEY_SCALE: u32 = 2;

/// Converts a decimal amount to integer minor units, rounding half away from zero.
///
/// # Errors
/// Returns `Error::InvalidAmount` if the amount does not fit in an `i64` of minor units.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    let scaled = amount
        .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::from(100))
        .ok_or(Error::InvalidAmount { amount })?;

    scaled.to_i64().ok_or(Error::InvalidAmount { amount })
}

/// Converts stored minor units back into a decimal amount.
#[must_use]
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, MONEY_SCALE)
}

/// Formats an amount with its currency code, e.g. `BDT 1,100.00`.
#[must_use]
pub fn format_money(amount: Decimal, currency: &str) -> String {
    let rounded = amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{currency} {sign}{grouped}.{fraction}")
}
