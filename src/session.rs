//! Session
//!
//! The signed-in shopper and their stored-value wallet.

use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::debug;

use crate::prices::{self, Amount};

/// Wallet errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalletError {
    /// The debit is larger than the balance.
    #[error("wallet balance {balance} is less than {requested}")]
    InsufficientBalance {
        /// Current balance, formatted
        balance: String,
        /// Requested debit, formatted
        requested: String,
    },

    /// The amount is in another currency.
    #[error("wallet is in {expected}, amount is in {found}")]
    CurrencyMismatch {
        /// Wallet currency code
        expected: &'static str,
        /// Amount currency code
        found: &'static str,
    },

    /// Negative amounts cannot be debited or credited.
    #[error("wallet amounts must not be negative")]
    NegativeAmount,
}

/// Signed-in shopper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Email address
    pub email: String,

    /// Display name
    pub name: String,

    /// Avatar URL
    pub profile_image: Option<String>,
}

impl User {
    /// Create a user without a profile image.
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            profile_image: None,
        }
    }
}

/// Stored-value balance. There is no transaction ledger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wallet {
    balance: Amount,
}

impl Wallet {
    /// Create a wallet holding the given balance.
    pub fn new(balance: Amount) -> Self {
        Self { balance }
    }

    /// An empty wallet.
    pub fn empty(currency: &'static Currency) -> Self {
        Self::new(prices::zero(currency))
    }

    /// Current balance.
    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Take money out of the wallet.
    ///
    /// # Errors
    ///
    /// Returns a [`WalletError`] if the amount is negative, in another
    /// currency, or larger than the balance.
    pub fn debit(&mut self, amount: Amount) -> Result<Amount, WalletError> {
        self.check(&amount)?;

        let remaining = self.balance.to_minor_units() - amount.to_minor_units();

        if remaining < 0 {
            return Err(WalletError::InsufficientBalance {
                balance: self.balance.to_string(),
                requested: amount.to_string(),
            });
        }

        self.balance = Money::from_minor(remaining, self.balance.currency());

        debug!(%amount, balance = %self.balance, "debited wallet");

        Ok(self.balance)
    }

    /// Put money into the wallet (refunds, referral rewards).
    ///
    /// # Errors
    ///
    /// Returns a [`WalletError`] if the amount is negative or in another
    /// currency.
    pub fn credit(&mut self, amount: Amount) -> Result<Amount, WalletError> {
        self.check(&amount)?;

        let total = self
            .balance
            .to_minor_units()
            .saturating_add(amount.to_minor_units());

        self.balance = Money::from_minor(total, self.balance.currency());

        debug!(%amount, balance = %self.balance, "credited wallet");

        Ok(self.balance)
    }

    fn check(&self, amount: &Amount) -> Result<(), WalletError> {
        if amount.currency() != self.balance.currency() {
            return Err(WalletError::CurrencyMismatch {
                expected: self.balance.currency().iso_alpha_code,
                found: amount.currency().iso_alpha_code,
            });
        }

        if amount.to_minor_units() < 0 {
            return Err(WalletError::NegativeAmount);
        }

        Ok(())
    }
}

/// Session state: the optional user plus their wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    user: Option<User>,
    wallet: Wallet,
}

impl Session {
    /// A logged-out session.
    pub fn anonymous(currency: &'static Currency) -> Self {
        Self {
            user: None,
            wallet: Wallet::empty(currency),
        }
    }

    /// Replace the session user; `None` logs out.
    ///
    /// Signing in credits the given starting balance; logging out empties the
    /// wallet.
    pub fn set_user(&mut self, user: Option<User>, starting_balance: Amount) {
        match user {
            Some(user) => {
                debug!(email = %user.email, "signed in");

                self.user = Some(user);
                self.wallet = Wallet::new(starting_balance);
            }
            None => {
                debug!("signed out");

                self.user = None;
                self.wallet = Wallet::empty(self.wallet.balance().currency());
            }
        }
    }

    /// Signed-in user.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Whether someone is signed in.
    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// Wallet.
    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    /// Wallet, mutably.
    pub fn wallet_mut(&mut self) -> &mut Wallet {
        &mut self.wallet
    }
}
