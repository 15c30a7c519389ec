//! Pricing
//!
//! The one place cart totals are derived. Every surface that shows totals
//! (cart page, checkout, order snapshot) calls [`quote`].

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    cart::CartLine,
    config::PricingRules,
    coupons::AppliedCoupon,
    prices::{self, Amount},
};

/// Errors that can occur while pricing a cart.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// An amount is in a different currency than the pricing rules.
    #[error("amount in {found}, pricing rules use {expected}")]
    CurrencyMismatch {
        /// Rules currency code
        expected: &'static str,
        /// Offending currency code
        found: &'static str,
    },

    /// Minor-unit arithmetic overflowed.
    #[error("price arithmetic overflowed")]
    Overflow,

    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,
}

/// Derived totals for a cart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBreakdown {
    subtotal: Amount,
    delivery_fee: Amount,
    coupon_discount: Amount,
    wallet_deduction: Amount,
    total: Amount,
}

impl PriceBreakdown {
    /// Sum of unit price times quantity over all lines.
    pub fn subtotal(&self) -> Amount {
        self.subtotal
    }

    /// Delivery fee; zero above the free-delivery threshold.
    pub fn delivery_fee(&self) -> Amount {
        self.delivery_fee
    }

    /// Amount taken off by the coupon.
    pub fn coupon_discount(&self) -> Amount {
        self.coupon_discount
    }

    /// Amount paid from the wallet.
    pub fn wallet_deduction(&self) -> Amount {
        self.wallet_deduction
    }

    /// Amount to pay.
    pub fn total(&self) -> Amount {
        self.total
    }

    /// Whether delivery is free.
    pub fn has_free_delivery(&self) -> bool {
        self.delivery_fee.to_minor_units() == 0
    }

    /// Coupon discount plus wallet deduction.
    pub fn savings(&self) -> Amount {
        Money::from_minor(
            self.coupon_discount
                .to_minor_units()
                .saturating_add(self.wallet_deduction.to_minor_units()),
            self.total.currency(),
        )
    }
}

/// Price a set of cart lines.
///
/// - subtotal = Σ unit price × quantity
/// - delivery fee = 0 if subtotal is strictly above the threshold, else the
///   flat fee
/// - coupon discount = the coupon's share of the subtotal
/// - wallet deduction (when `wallet_balance` is given) =
///   `min(balance, min(share of subtotal, cap))`
/// - total = subtotal + delivery − coupon − wallet, never below zero
///
/// # Errors
///
/// Returns a [`PricingError`] on currency mismatch or arithmetic overflow.
pub fn quote(
    lines: &[CartLine],
    rules: &PricingRules,
    coupon: Option<&AppliedCoupon<'_>>,
    wallet_balance: Option<Amount>,
) -> Result<PriceBreakdown, PricingError> {
    let subtotal = subtotal(lines, rules.currency)?;
    let delivery_fee = delivery_fee(&subtotal, rules)?;

    let coupon_discount = match coupon {
        Some(coupon) => percent_of(&coupon.discount(), &subtotal)?,
        None => prices::zero(rules.currency),
    };

    let wallet_deduction = match wallet_balance {
        Some(balance) => wallet_deduction(&subtotal, balance, rules)?,
        None => prices::zero(rules.currency),
    };

    let total = subtotal
        .to_minor_units()
        .checked_add(delivery_fee.to_minor_units())
        .and_then(|sum| sum.checked_sub(coupon_discount.to_minor_units()))
        .and_then(|sum| sum.checked_sub(wallet_deduction.to_minor_units()))
        .ok_or(PricingError::Overflow)?
        .max(0);

    Ok(PriceBreakdown {
        subtotal,
        delivery_fee,
        coupon_discount,
        wallet_deduction,
        total: Money::from_minor(total, rules.currency),
    })
}

/// Sum of unit price × quantity.
///
/// # Errors
///
/// Returns a [`PricingError`] if a line is in another currency or the sum
/// overflows.
pub fn subtotal(lines: &[CartLine], currency: &'static Currency) -> Result<Amount, PricingError> {
    lines
        .iter()
        .try_fold(prices::zero(currency), |acc, line| {
            ensure_currency(&line.unit_price(), currency)?;

            let line_total = line.line_total().ok_or(PricingError::Overflow)?;

            acc.to_minor_units()
                .checked_add(line_total.to_minor_units())
                .map(|sum| Money::from_minor(sum, currency))
                .ok_or(PricingError::Overflow)
        })
}

/// Delivery fee for a subtotal: free strictly above the threshold.
///
/// # Errors
///
/// Returns [`PricingError::CurrencyMismatch`] if the subtotal is in another
/// currency.
pub fn delivery_fee(subtotal: &Amount, rules: &PricingRules) -> Result<Amount, PricingError> {
    ensure_currency(subtotal, rules.currency)?;

    if subtotal.to_minor_units() > rules.free_delivery_above.to_minor_units() {
        Ok(prices::zero(rules.currency))
    } else {
        Ok(rules.delivery_fee)
    }
}

/// How much of the order the wallet pays for.
///
/// # Errors
///
/// Returns a [`PricingError`] on currency mismatch or if the share cannot be
/// computed.
pub fn wallet_deduction(
    subtotal: &Amount,
    balance: Amount,
    rules: &PricingRules,
) -> Result<Amount, PricingError> {
    ensure_currency(subtotal, rules.currency)?;
    ensure_currency(&balance, rules.currency)?;

    let share = percent_of(&rules.wallet.max_share, subtotal)?;
    let allowed = prices::min(share, rules.wallet.cap);
    let deduction = prices::min(balance, allowed);

    Ok(Money::from_minor(
        deduction.to_minor_units().max(0),
        rules.currency,
    ))
}

/// Percentage of an amount, rounded half away from zero to minor units.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the calculation overflows.
pub fn percent_of(percent: &Percentage, amount: &Amount) -> Result<Amount, PricingError> {
    let minor = percent_of_minor(percent, amount.to_minor_units())?;

    Ok(Money::from_minor(minor, amount.currency()))
}

fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, PricingError> {
    let minor = Decimal::from_i64(minor).ok_or(PricingError::PercentConversion)?;

    ((*percent) * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(PricingError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::PercentConversion)
}

fn ensure_currency(amount: &Amount, currency: &'static Currency) -> Result<(), PricingError> {
    if amount.currency() == currency {
        Ok(())
    } else {
        Err(PricingError::CurrencyMismatch {
            expected: currency.iso_alpha_code,
            found: amount.currency().iso_alpha_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use rusty_money::iso::{GBP, INR};
    use testresult::TestResult;

    use crate::{cart::LineKey, coupons::apply_coupon};

    use super::*;

    fn line(id: &str, rupees: i64, quantity: u32) -> TestResult<CartLine> {
        Ok(CartLine::new(
            LineKey::from(id),
            id,
            Money::from_minor(rupees * 100, INR),
            NonZeroU32::new(quantity).ok_or("quantity must be non-zero")?,
        ))
    }

    #[test]
    fn subtotal_of_empty_cart_is_zero() -> TestResult {
        assert_eq!(subtotal(&[], INR)?, Money::from_minor(0, INR));

        Ok(())
    }

    #[test]
    fn subtotal_rejects_foreign_lines() -> TestResult {
        let lines = [CartLine::new(
            LineKey::from("1"),
            "1",
            Money::from_minor(100, GBP),
            NonZeroU32::MIN,
        )];

        assert!(matches!(
            subtotal(&lines, INR),
            Err(PricingError::CurrencyMismatch { .. })
        ));

        Ok(())
    }

    #[test]
    fn delivery_fee_threshold_is_exclusive() -> TestResult {
        let rules = PricingRules::default();

        assert_eq!(
            delivery_fee(&Money::from_minor(50_000, INR), &rules)?,
            Money::from_minor(4_000, INR)
        );
        assert_eq!(
            delivery_fee(&Money::from_minor(50_001, INR), &rules)?,
            Money::from_minor(0, INR)
        );

        Ok(())
    }

    #[test]
    fn wallet_deduction_takes_smallest_limit() -> TestResult {
        let rules = PricingRules::default();

        // share of subtotal: 10% of 300 = 30
        assert_eq!(
            wallet_deduction(
                &Money::from_minor(30_000, INR),
                Money::from_minor(25_000, INR),
                &rules
            )?,
            Money::from_minor(3_000, INR)
        );

        // cap: 10% of 5000 = 500, capped to 100
        assert_eq!(
            wallet_deduction(
                &Money::from_minor(500_000, INR),
                Money::from_minor(25_000, INR),
                &rules
            )?,
            Money::from_minor(10_000, INR)
        );

        // balance: only 20 left
        assert_eq!(
            wallet_deduction(
                &Money::from_minor(500_000, INR),
                Money::from_minor(2_000, INR),
                &rules
            )?,
            Money::from_minor(2_000, INR)
        );

        Ok(())
    }

    #[test]
    fn percent_of_rounds_half_away_from_zero() -> TestResult {
        // 20% of 0.03 = 0.006 -> rounds to 0.01
        let amount = percent_of(&Percentage::from(0.2), &Money::from_minor(3, INR))?;

        assert_eq!(amount, Money::from_minor(1, INR));

        Ok(())
    }

    #[test]
    fn percent_of_overflow_returns_error() {
        let result = percent_of(&Percentage::from(2.0), &Money::from_minor(i64::MAX, INR));

        assert_eq!(result, Err(PricingError::PercentConversion));
    }

    #[test]
    fn quote_combines_coupon_and_wallet() -> TestResult {
        let rules = PricingRules::default();
        let coupon = apply_coupon("fresh20", &rules.coupon)?;
        let lines = [line("1", 699, 2)?, line("2", 600, 1)?];

        let breakdown = quote(
            &lines,
            &rules,
            Some(&coupon),
            Some(Money::from_minor(25_000, INR)),
        )?;

        assert_eq!(breakdown.subtotal(), Money::from_minor(199_800, INR));
        assert!(breakdown.has_free_delivery());
        assert_eq!(breakdown.coupon_discount(), Money::from_minor(39_960, INR));
        assert_eq!(breakdown.wallet_deduction(), Money::from_minor(10_000, INR));
        assert_eq!(breakdown.total(), Money::from_minor(149_840, INR));
        assert_eq!(breakdown.savings(), Money::from_minor(49_960, INR));

        Ok(())
    }

    #[test]
    fn quote_small_cart_pays_delivery() -> TestResult {
        let rules = PricingRules::default();
        let lines = [line("8", 199, 1)?];

        let breakdown = quote(&lines, &rules, None, None)?;

        assert_eq!(breakdown.delivery_fee(), Money::from_minor(4_000, INR));
        assert_eq!(breakdown.total(), Money::from_minor(23_900, INR));

        Ok(())
    }

    #[test]
    fn quote_never_goes_negative() -> TestResult {
        let mut rules = PricingRules::default();
        rules.coupon.discount = Percentage::from(1.0);
        rules.wallet.max_share = Percentage::from(1.0);
        rules.delivery_fee = Money::from_minor(0, INR);

        let coupon = apply_coupon("FRESH20", &rules.coupon)?;
        let lines = [line("8", 100, 1)?];

        let breakdown = quote(
            &lines,
            &rules,
            Some(&coupon),
            Some(Money::from_minor(10_000, INR)),
        )?;

        assert_eq!(breakdown.total(), Money::from_minor(0, INR));

        Ok(())
    }
}
