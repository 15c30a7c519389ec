//! Prices

use rusty_money::{Money, iso::Currency};

/// A monetary amount in one of the ISO currencies.
pub type Amount = Money<'static, Currency>;

/// Zero in the given currency.
pub fn zero(currency: &'static Currency) -> Amount {
    Money::from_minor(0, currency)
}

/// Build an amount from whole currency units (rupees, pounds, ...).
///
/// Returns `None` if the minor-unit value would overflow.
pub fn from_major(major: i64, currency: &'static Currency) -> Option<Amount> {
    let factor = 10_i64.checked_pow(currency.exponent)?;

    major
        .checked_mul(factor)
        .map(|minor| Money::from_minor(minor, currency))
}

/// Multiply a unit price by a quantity, in minor units.
///
/// Returns `None` on overflow.
pub fn times(price: &Amount, quantity: u32) -> Option<Amount> {
    price
        .to_minor_units()
        .checked_mul(i64::from(quantity))
        .map(|minor| Money::from_minor(minor, price.currency()))
}

/// The smaller of two amounts in the same currency.
pub fn min(a: Amount, b: Amount) -> Amount {
    if a.to_minor_units() <= b.to_minor_units() {
        a
    } else {
        b
    }
}
