//! Payment methods

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Unrecognised payment method name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown payment method {0:?}")]
pub struct UnknownPaymentMethod(pub String);

/// How the shopper pays the order total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PaymentMethod {
    /// UPI app or VPA
    #[default]
    Upi,

    /// Credit or debit card
    Card,

    /// Net banking
    NetBanking,

    /// Cash on delivery
    CashOnDelivery,
}

impl PaymentMethod {
    /// Every method, in display order.
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Upi,
        PaymentMethod::Card,
        PaymentMethod::NetBanking,
        PaymentMethod::CashOnDelivery,
    ];

    /// Short name.
    pub fn name(self) -> &'static str {
        match self {
            PaymentMethod::Upi => "upi",
            PaymentMethod::Card => "card",
            PaymentMethod::NetBanking => "netbanking",
            PaymentMethod::CashOnDelivery => "cod",
        }
    }

    /// Label shown at checkout.
    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Upi => "UPI",
            PaymentMethod::Card => "Credit / Debit Card",
            PaymentMethod::NetBanking => "Net Banking",
            PaymentMethod::CashOnDelivery => "Cash on Delivery",
        }
    }

    /// Whether money changes hands before delivery.
    pub fn is_prepaid(self) -> bool {
        !matches!(self, PaymentMethod::CashOnDelivery)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPaymentMethod(s.to_string()))
    }
}
