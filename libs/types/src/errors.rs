//! Error types for the shared arithmetic

use alloy_primitives::U256;
use thiserror::Error;

/// Fee arithmetic errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeeError {
    #[error("Arithmetic overflow in fee calculation")]
    Overflow,

    #[error("Referral bonus {share} exceeds 100% of the fee")]
    BonusTooHigh { share: U256 },
}

/// Order decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("Unknown order type id: {0}")]
    UnknownOrderType(u8),

    #[error("Invalid signature length: expected 65 bytes, got {0}")]
    InvalidSignatureLength(usize),
}
