//! Storefront configuration
//!
//! Pricing rules and order timings. Defaults match the live storefront; a
//! YAML file can override any of them.

use std::{fs, path::Path};

use decimal_percentage::Percentage;
use jiff::SignedDuration;
use rust_decimal::Decimal;
use rusty_money::{
    Money,
    iso::{Currency, INR},
};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    fixtures::{
        FixtureError,
        products::{parse_amount, parse_currency, parse_percentage},
    },
    prices::{self, Amount},
};

// Default amounts in whole currency units.
const FREE_DELIVERY_ABOVE: i64 = 500;
const DELIVERY_FEE: i64 = 40;
const WALLET_CAP: i64 = 100;
const WALLET_BALANCE: i64 = 250;

const CANCELLATION_WINDOW_MINUTES: i64 = 15;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// A price, percentage or currency could not be parsed
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    /// A value parsed but is out of range
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Config field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Percentage-off coupon.
#[derive(Debug, Clone)]
pub struct CouponRule {
    /// Code the shopper types, compared case-insensitively
    pub code: String,

    /// Share of the subtotal taken off
    pub discount: Percentage,
}

/// Cap on how much of an order the wallet may pay for.
#[derive(Debug, Clone)]
pub struct WalletRule {
    /// Largest share of the subtotal the wallet may cover
    pub max_share: Percentage,

    /// Absolute ceiling on the deduction
    pub cap: Amount,
}

/// Rules used by [`crate::pricing::quote`].
#[derive(Debug, Clone)]
pub struct PricingRules {
    /// Currency every amount is expressed in
    pub currency: &'static Currency,

    /// Delivery is free when the subtotal is strictly greater than this
    pub free_delivery_above: Amount,

    /// Flat delivery fee charged otherwise
    pub delivery_fee: Amount,

    /// The storefront coupon
    pub coupon: CouponRule,

    /// Wallet deduction limits
    pub wallet: WalletRule,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            currency: INR,
            free_delivery_above: Money::from_minor(FREE_DELIVERY_ABOVE * 100, INR),
            delivery_fee: Money::from_minor(DELIVERY_FEE * 100, INR),
            coupon: CouponRule {
                code: "FRESH20".to_string(),
                discount: Percentage::from(0.2),
            },
            wallet: WalletRule {
                max_share: Percentage::from(0.1),
                cap: Money::from_minor(WALLET_CAP * 100, INR),
            },
        }
    }
}

/// Top-level storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Pricing rules
    pub pricing: PricingRules,

    /// How long after placement an order may still be cancelled
    pub cancellation_window: SignedDuration,

    /// Balance credited to a freshly signed-in session's wallet
    pub wallet_balance: Amount,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            pricing: PricingRules::default(),
            cancellation_window: SignedDuration::from_mins(CANCELLATION_WINDOW_MINUTES),
            wallet_balance: Money::from_minor(WALLET_BALANCE * 100, INR),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFixture {
    currency: Option<String>,
    #[serde(default)]
    pricing: PricingFixture,
    #[serde(default)]
    orders: OrdersFixture,
    wallet_balance: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PricingFixture {
    free_delivery_above: Option<String>,
    delivery_fee: Option<String>,
    coupon: Option<CouponFixture>,
    wallet: Option<WalletFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CouponFixture {
    code: String,
    discount: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WalletFixture {
    max_share: String,
    cap: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct OrdersFixture {
    cancellation_window_minutes: Option<i64>,
}

impl StorefrontConfig {
    /// Parse configuration from YAML, falling back to defaults for anything
    /// left out.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the YAML is malformed or a value is out
    /// of range.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let fixture: ConfigFixture = serde_norway::from_str(yaml)?;
        let mut config = Self::default();

        if let Some(code) = fixture.currency.as_deref() {
            let currency = parse_currency(code)?;

            config.pricing.currency = currency;
            config.pricing.free_delivery_above =
                default_amount("pricing.free_delivery_above", FREE_DELIVERY_ABOVE, currency)?;
            config.pricing.delivery_fee =
                default_amount("pricing.delivery_fee", DELIVERY_FEE, currency)?;
            config.pricing.wallet.cap = default_amount("pricing.wallet.cap", WALLET_CAP, currency)?;
            config.wallet_balance = default_amount("wallet_balance", WALLET_BALANCE, currency)?;
        }

        if let Some(threshold) = fixture.pricing.free_delivery_above.as_deref() {
            config.pricing.free_delivery_above = parse_amount(threshold)?;
        }

        if let Some(fee) = fixture.pricing.delivery_fee.as_deref() {
            config.pricing.delivery_fee = parse_amount(fee)?;
        }

        if let Some(coupon) = fixture.pricing.coupon {
            config.pricing.coupon = CouponRule {
                code: coupon.code.trim().to_string(),
                discount: parse_percentage(&coupon.discount)?,
            };
        }

        if let Some(wallet) = fixture.pricing.wallet {
            config.pricing.wallet = WalletRule {
                max_share: parse_percentage(&wallet.max_share)?,
                cap: parse_amount(&wallet.cap)?,
            };
        }

        if let Some(minutes) = fixture.orders.cancellation_window_minutes {
            config.cancellation_window = cancellation_window(minutes)?;
        }

        if let Some(balance) = fixture.wallet_balance.as_deref() {
            config.wallet_balance = parse_amount(balance)?;
        }

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let currency = self.pricing.currency;

        let amounts = [
            ("pricing.free_delivery_above", &self.pricing.free_delivery_above),
            ("pricing.delivery_fee", &self.pricing.delivery_fee),
            ("pricing.wallet.cap", &self.pricing.wallet.cap),
            ("wallet_balance", &self.wallet_balance),
        ];

        for (field, amount) in amounts {
            if amount.currency() != currency {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!(
                        "priced in {}, expected {}",
                        amount.currency().iso_alpha_code,
                        currency.iso_alpha_code
                    ),
                });
            }

            if amount.to_minor_units() < 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must not be negative".to_string(),
                });
            }
        }

        let shares = [
            ("pricing.coupon.discount", &self.pricing.coupon.discount),
            ("pricing.wallet.max_share", &self.pricing.wallet.max_share),
        ];

        for (field, share) in shares {
            let value = *share * Decimal::ONE;

            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be between 0% and 100%".to_string(),
                });
            }
        }

        if self.pricing.coupon.code.is_empty() {
            return Err(ConfigError::Invalid {
                field: "pricing.coupon.code",
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

fn default_amount(
    field: &'static str,
    major: i64,
    currency: &'static Currency,
) -> Result<Amount, ConfigError> {
    prices::from_major(major, currency).ok_or_else(|| ConfigError::Invalid {
        field,
        reason: format!("default does not fit in {}", currency.iso_alpha_code),
    })
}

fn cancellation_window(minutes: i64) -> Result<SignedDuration, ConfigError> {
    const FIELD: &str = "orders.cancellation_window_minutes";

    if minutes < 0 {
        return Err(ConfigError::Invalid {
            field: FIELD,
            reason: "must not be negative".to_string(),
        });
    }

    minutes
        .checked_mul(60)
        .map(SignedDuration::from_secs)
        .ok_or_else(|| ConfigError::Invalid {
            field: FIELD,
            reason: format!("{minutes} minutes is out of range"),
        })
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, JPY};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn defaults_match_storefront_rules() {
        let config = StorefrontConfig::default();

        assert_eq!(config.pricing.currency, INR);
        assert_eq!(
            config.pricing.free_delivery_above,
            Money::from_minor(50_000, INR)
        );
        assert_eq!(config.pricing.delivery_fee, Money::from_minor(4_000, INR));
        assert_eq!(config.pricing.coupon.code, "FRESH20");
        assert_eq!(config.pricing.coupon.discount, Percentage::from(0.2));
        assert_eq!(config.pricing.wallet.max_share, Percentage::from(0.1));
        assert_eq!(config.pricing.wallet.cap, Money::from_minor(10_000, INR));
        assert_eq!(config.cancellation_window, SignedDuration::from_mins(15));
    }

    #[test]
    fn empty_yaml_yields_defaults() -> TestResult {
        let config = StorefrontConfig::from_yaml_str("{}")?;

        assert_eq!(config.pricing.coupon.code, "FRESH20");
        assert_eq!(config.wallet_balance, Money::from_minor(25_000, INR));

        Ok(())
    }

    #[test]
    fn yaml_overrides_selected_values() -> TestResult {
        let config = StorefrontConfig::from_yaml_str(
            "pricing:
  delivery_fee: 49 INR
  coupon:
    code: ' SEA10 '
    discount: 10%
orders:
  cancellation_window_minutes: 30
",
        )?;

        assert_eq!(config.pricing.delivery_fee, Money::from_minor(4_900, INR));
        assert_eq!(config.pricing.coupon.code, "SEA10");
        assert_eq!(config.pricing.coupon.discount, Percentage::from(0.1));
        assert_eq!(config.cancellation_window, SignedDuration::from_mins(30));
        assert_eq!(
            config.pricing.free_delivery_above,
            Money::from_minor(50_000, INR)
        );

        Ok(())
    }

    #[test]
    fn currency_switch_rebases_defaults() -> TestResult {
        let config = StorefrontConfig::from_yaml_str("currency: GBP\n")?;

        assert_eq!(config.pricing.currency, GBP);
        assert_eq!(config.pricing.delivery_fee, Money::from_minor(4_000, GBP));
        assert_eq!(config.wallet_balance.currency(), GBP);

        Ok(())
    }

    #[test]
    fn currency_switch_rescales_by_exponent() -> TestResult {
        let config = StorefrontConfig::from_yaml_str("currency: JPY
")?;

        assert_eq!(config.pricing.free_delivery_above, Money::from_minor(500, JPY));
        assert_eq!(config.pricing.delivery_fee, Money::from_minor(40, JPY));
        assert_eq!(config.pricing.wallet.cap, Money::from_minor(100, JPY));
        assert_eq!(config.wallet_balance, Money::from_minor(250, JPY));

        Ok(())
    }

    #[test]
    fn out_of_range_cancellation_window_is_rejected() {
        for minutes in [i64::MAX, i64::MAX / 60 + 1, -1] {
            let result = StorefrontConfig::from_yaml_str(&format!(
                "orders:\n  cancellation_window_minutes: {minutes}\n"
            ));

            assert!(
                matches!(
                    result,
                    Err(ConfigError::Invalid {
                        field: "orders.cancellation_window_minutes",
                        ..
                    })
                ),
                "{minutes} minutes should be rejected"
            );
        }
    }

    #[test]
    fn mixed_currency_is_rejected() {
        let result = StorefrontConfig::from_yaml_str("pricing:\n  delivery_fee: 3 GBP\n");

        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "pricing.delivery_fee",
                ..
            })
        ));
    }

    #[test]
    fn share_above_one_hundred_percent_is_rejected() {
        let result = StorefrontConfig::from_yaml_str(
            "pricing:\n  wallet:\n    max_share: 150%\n    cap: 100 INR\n",
        );

        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "pricing.wallet.max_share",
                ..
            })
        ));
    }

    #[test]
    fn bundled_config_matches_defaults() -> TestResult {
        let bundled = StorefrontConfig::from_yaml_str(include_str!("../fixtures/storefront.yml"))?;
        let defaults = StorefrontConfig::default();

        assert_eq!(bundled.pricing.free_delivery_above, defaults.pricing.free_delivery_above);
        assert_eq!(bundled.pricing.delivery_fee, defaults.pricing.delivery_fee);
        assert_eq!(bundled.pricing.coupon.code, defaults.pricing.coupon.code);
        assert_eq!(bundled.pricing.wallet.cap, defaults.pricing.wallet.cap);
        assert_eq!(bundled.cancellation_window, defaults.cancellation_window);
        assert_eq!(bundled.wallet_balance, defaults.wallet_balance);

        Ok(())
    }

    #[test]
    fn load_reads_a_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("storefront.yml");
        std::fs::write(&path, "orders:\n  cancellation_window_minutes: 5\n")?;

        let config = StorefrontConfig::load(&path)?;

        assert_eq!(config.cancellation_window, SignedDuration::from_mins(5));
        assert!(matches!(
            StorefrontConfig::load(dir.path().join("missing.yml")),
            Err(ConfigError::Io(_))
        ));

        Ok(())
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = StorefrontConfig::from_yaml_str("shipping: free\n");

        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }
}
