//! Exchange configuration
//!
//! Deployment parameters, loadable from JSON. Amount fields accept the
//! `0x`-prefixed hex strings produced by serialization.

use alloy_primitives::{Address, U256};
use panther_types::fee::{
    DEFAULT_MARKET_TAKER_FEE, DEFAULT_REFERRAL_BONUS, MAX_MARKET_TAKER_FEE, MAX_REFERRAL_BONUS,
};
use serde::{Deserialize, Serialize};

use crate::errors::ExchangeError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Initial admin; receives fees and may change the parameters below
    pub admin: Address,
    /// Taker fee rate in fee units (`1e18` = 100 %)
    #[serde(default = "default_market_taker_fee")]
    pub market_taker_fee: U256,
    /// Referrer's share of each fee in fee units
    #[serde(default = "default_referral_bonus")]
    pub referral_bonus: U256,
    /// Block height the exchange starts at
    #[serde(default)]
    pub start_block: u64,
}

fn default_market_taker_fee() -> U256 {
    DEFAULT_MARKET_TAKER_FEE
}

fn default_referral_bonus() -> U256 {
    DEFAULT_REFERRAL_BONUS
}

impl ExchangeConfig {
    /// Deployment defaults: 0.3 % taker fee, 50 % referral bonus.
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            market_taker_fee: DEFAULT_MARKET_TAKER_FEE,
            referral_bonus: DEFAULT_REFERRAL_BONUS,
            start_block: 0,
        }
    }

    pub fn with_fees(mut self, market_taker_fee: U256, referral_bonus: U256) -> Self {
        self.market_taker_fee = market_taker_fee;
        self.referral_bonus = referral_bonus;
        self
    }

    pub fn with_start_block(mut self, start_block: u64) -> Self {
        self.start_block = start_block;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ExchangeError> {
        serde_json::from_str(json).map_err(|e| ExchangeError::ConstructionRejected {
            reason: format!("invalid config: {e}"),
        })
    }

    /// Reject parameters outside their fixed ceilings.
    pub fn validate(&self) -> Result<(), ExchangeError> {
        if self.market_taker_fee > MAX_MARKET_TAKER_FEE {
            return Err(ExchangeError::ConstructionRejected {
                reason: format!(
                    "market taker fee {} exceeds {}",
                    self.market_taker_fee, MAX_MARKET_TAKER_FEE
                ),
            });
        }
        if self.referral_bonus > MAX_REFERRAL_BONUS {
            return Err(ExchangeError::ConstructionRejected {
                reason: format!(
                    "referral bonus {} exceeds {}",
                    self.referral_bonus, MAX_REFERRAL_BONUS
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExchangeConfig::new(Address::repeat_byte(1));
        assert_eq!(config.market_taker_fee, MAX_MARKET_TAKER_FEE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fee_too_high_rejected() {
        let config = ExchangeConfig::new(Address::repeat_byte(1))
            .with_fees(MAX_MARKET_TAKER_FEE + U256::from(1), DEFAULT_REFERRAL_BONUS);
        assert!(matches!(
            config.validate(),
            Err(ExchangeError::ConstructionRejected { .. })
        ));
    }

    #[test]
    fn test_bonus_too_high_rejected() {
        let config = ExchangeConfig::new(Address::repeat_byte(1))
            .with_fees(DEFAULT_MARKET_TAKER_FEE, MAX_REFERRAL_BONUS + U256::from(1));
        assert!(matches!(
            config.validate(),
            Err(ExchangeError::ConstructionRejected { .. })
        ));
    }

    #[test]
    fn test_from_json_applies_defaults() {
        let json = r#"{"admin":"0x0101010101010101010101010101010101010101"}"#;
        let config = ExchangeConfig::from_json(json).unwrap();
        assert_eq!(config, ExchangeConfig::new(Address::repeat_byte(1)));
    }

    #[test]
    fn test_from_json_explicit_values() {
        let json = r#"{
            "admin": "0x0101010101010101010101010101010101010101",
            "market_taker_fee": "0xaa87bee538000",
            "referral_bonus": "0xde0b6b3a7640000",
            "start_block": 42
        }"#;
        let config = ExchangeConfig::from_json(json).unwrap();
        assert_eq!(config.market_taker_fee, MAX_MARKET_TAKER_FEE);
        assert_eq!(config.referral_bonus, MAX_REFERRAL_BONUS);
        assert_eq!(config.start_block, 42);
    }

    #[test]
    fn test_from_json_malformed() {
        let result = ExchangeConfig::from_json("{not json");
        assert!(matches!(result, Err(ExchangeError::ConstructionRejected { .. })));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = ExchangeConfig::new(Address::repeat_byte(9)).with_start_block(7);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(ExchangeConfig::from_json(&json).unwrap(), config);
    }
}
