//! Contract-specific error types
//!
//! Every error here aborts the enclosing call: no ledger mutation and no
//! event survives a failed operation.

use alloy_primitives::{Address, U256};
use panther_types::errors::FeeError;
use panther_types::fee::MAX_REFERRAL_BONUS;
use thiserror::Error;

/// Rejections reported by an external token contract
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token balance too low: required {required}, available {available}")]
    InsufficientBalance { required: U256, available: U256 },

    #[error("Token allowance too low: required {required}, available {available}")]
    InsufficientAllowance { required: U256, available: U256 },

    #[error("Token balance overflow")]
    Overflow,
}

/// Balance ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient {asset} balance: required {required}, available {available}")]
    InsufficientFunds {
        asset: String,
        required: U256,
        available: U256,
    },

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,

    #[error("Token {token} rejected the transfer: {reason}")]
    ExternalTransferFailed { token: Address, reason: String },
}

/// Top-level exchange error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("Construction rejected: {reason}")]
    ConstructionRejected { reason: String },

    #[error("Unauthorized: {caller} may not perform this operation")]
    Unauthorized { caller: Address },

    #[error("{parameter} out of range: {value} exceeds {max}")]
    OutOfRange {
        parameter: &'static str,
        value: U256,
        max: U256,
    },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Order overfill: requested {requested}, remaining {remaining}")]
    OrderOverfill { requested: U256, remaining: U256 },

    #[error("Invalid signature for order")]
    InvalidSignature,

    #[error("Order expired at block {expiration_block}, current block {current_block}")]
    OrderExpired {
        expiration_block: u64,
        current_block: u64,
    },

    #[error("Self-trade prevention triggered")]
    SelfTrade,

    #[error("Invalid order: {reason}")]
    InvalidOrder { reason: String },

    #[error("Arithmetic overflow")]
    Overflow,
}

impl From<FeeError> for ExchangeError {
    fn from(err: FeeError) -> Self {
        match err {
            FeeError::Overflow => ExchangeError::Overflow,
            FeeError::BonusTooHigh { share } => ExchangeError::OutOfRange {
                parameter: "referral_bonus",
                value: share,
                max: MAX_REFERRAL_BONUS,
            },
        }
    }
}

impl ExchangeError {
    /// True when an ether or token balance was too low for the operation.
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(self, ExchangeError::Ledger(LedgerError::InsufficientFunds { .. }))
    }

    /// True when an external token contract refused to move funds.
    pub fn is_external_transfer_failure(&self) -> bool {
        matches!(
            self,
            ExchangeError::Ledger(LedgerError::ExternalTransferFailed { .. })
        )
    }
}
