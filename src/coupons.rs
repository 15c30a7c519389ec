//! Coupons

use decimal_percentage::Percentage;
use thiserror::Error;
use tracing::warn;

use crate::config::CouponRule;

/// Coupon validation errors, shown to the shopper as a notification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CouponError {
    /// Nothing was entered.
    #[error("please enter a coupon code")]
    Empty,

    /// The code does not match any coupon.
    #[error("invalid coupon code {0:?}")]
    Invalid(String),
}

/// A coupon that passed validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedCoupon<'a> {
    code: &'a str,
    discount: Percentage,
}

impl<'a> AppliedCoupon<'a> {
    /// Canonical code, as configured.
    pub fn code(&self) -> &'a str {
        self.code
    }

    /// Share of the subtotal taken off.
    pub fn discount(&self) -> Percentage {
        self.discount
    }
}

/// Validate an entered code against the storefront coupon.
///
/// Matching ignores case and surrounding whitespace.
///
/// # Errors
///
/// Returns [`CouponError::Empty`] for a blank code and
/// [`CouponError::Invalid`] for anything else that does not match.
pub fn apply_coupon<'a>(entered: &str, rule: &'a CouponRule) -> Result<AppliedCoupon<'a>, CouponError> {
    let entered = entered.trim();

    if entered.is_empty() {
        return Err(CouponError::Empty);
    }

    if !entered.eq_ignore_ascii_case(&rule.code) {
        warn!(code = entered, "rejected coupon code");

        return Err(CouponError::Invalid(entered.to_string()));
    }

    Ok(AppliedCoupon {
        code: &rule.code,
        discount: rule.discount,
    })
}
