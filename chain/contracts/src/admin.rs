//! Administration — admin identity and the two bounded fee parameters
//!
//! Only the current admin may change any of them; admin identity itself is
//! transferable by the current admin.

use alloy_primitives::{Address, U256};
use panther_types::fee::{MAX_MARKET_TAKER_FEE, MAX_REFERRAL_BONUS};
use tracing::info;

use crate::config::ExchangeConfig;
use crate::errors::ExchangeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
    admin: Address,
    market_taker_fee: U256,
    referral_bonus: U256,
}

impl AdminConfig {
    /// Build from a validated deployment config.
    pub fn new(config: &ExchangeConfig) -> Result<Self, ExchangeError> {
        config.validate()?;
        Ok(Self {
            admin: config.admin,
            market_taker_fee: config.market_taker_fee,
            referral_bonus: config.referral_bonus,
        })
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn market_taker_fee(&self) -> U256 {
        self.market_taker_fee
    }

    pub fn referral_bonus(&self) -> U256 {
        self.referral_bonus
    }

    pub fn is_admin(&self, caller: &Address) -> bool {
        *caller == self.admin
    }

    fn ensure_admin(&self, caller: &Address) -> Result<(), ExchangeError> {
        if !self.is_admin(caller) {
            return Err(ExchangeError::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    /// Transfer admin to a new address.
    pub fn set_admin(&mut self, caller: &Address, new_admin: Address) -> Result<(), ExchangeError> {
        self.ensure_admin(caller)?;
        info!(old = %self.admin, new = %new_admin, "admin transferred");
        self.admin = new_admin;
        Ok(())
    }

    pub fn set_market_taker_fee(&mut self, caller: &Address, rate: U256) -> Result<(), ExchangeError> {
        self.ensure_admin(caller)?;
        if rate > MAX_MARKET_TAKER_FEE {
            return Err(ExchangeError::OutOfRange {
                parameter: "market_taker_fee",
                value: rate,
                max: MAX_MARKET_TAKER_FEE,
            });
        }
        info!(%rate, "market taker fee updated");
        self.market_taker_fee = rate;
        Ok(())
    }

    pub fn set_referral_bonus(&mut self, caller: &Address, share: U256) -> Result<(), ExchangeError> {
        self.ensure_admin(caller)?;
        if share > MAX_REFERRAL_BONUS {
            return Err(ExchangeError::OutOfRange {
                parameter: "referral_bonus",
                value: share,
                max: MAX_REFERRAL_BONUS,
            });
        }
        info!(%share, "referral bonus updated");
        self.referral_bonus = share;
        Ok(())
    }
}
