//! Monetary amount helpers
//!
//! Shared minor-unit arithmetic used by the engine, the campaign manager and
//! the coupon validator. All rounding is half-up (`MidpointAwayFromZero`);
//! amounts in this crate are never negative.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::iso::Currency;
use thiserror::Error;

/// Errors specific to amount calculations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// A minor-unit calculation overflowed.
    #[error("minor unit amount overflowed")]
    Overflow,
}

/// Calculate a percentage of a minor-unit amount, rounded half-up.
///
/// # Errors
///
/// Returns [`AmountError::PercentConversion`] if the product overflows or
/// cannot be represented in minor units.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, AmountError> {
    let minor = Decimal::from_i64(minor).ok_or(AmountError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage doesn't expose the underlying Decimal
        .checked_mul(minor)
        .ok_or(AmountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(AmountError::PercentConversion)
}

/// Convert a decimal major-unit amount into minor units for a currency,
/// rounded half-up at the currency's exponent.
///
/// # Errors
///
/// Returns [`AmountError::Overflow`] if the scaled amount does not fit in
/// `i64`.
pub fn decimal_to_minor(amount: Decimal, currency: &Currency) -> Result<i64, AmountError> {
    let scale = Decimal::from(10u64.pow(currency.exponent));

    amount
        .checked_mul(scale)
        .ok_or(AmountError::Overflow)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(AmountError::Overflow)
}

/// Multiply a unit price in minor units by a quantity.
///
/// # Errors
///
/// Returns [`AmountError::Overflow`] on `i64` overflow.
pub fn times_quantity(unit_minor: i64, quantity: u32) -> Result<i64, AmountError> {
    unit_minor
        .checked_mul(i64::from(quantity))
        .ok_or(AmountError::Overflow)
}
