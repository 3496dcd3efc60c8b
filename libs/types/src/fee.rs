//! Fee calculation types
//!
//! Fee rates and referral shares are fixed-point fractions of `FEE_UNIT`
//! (`1e18` = 100 %). The taker pays the fee in ether; it is split between
//! the platform admin and the taker's referrer, if any.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::errors::FeeError;

/// 100 % in fee units
pub const FEE_UNIT: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Absolute ceiling for the market taker fee rate (0.3 %)
pub const MAX_MARKET_TAKER_FEE: U256 = U256::from_limbs([3_000_000_000_000_000, 0, 0, 0]);

/// Referral bonus ceiling: the referrer can never take more than the whole fee
pub const MAX_REFERRAL_BONUS: U256 = FEE_UNIT;

/// Deployment default taker fee rate (0.3 %)
pub const DEFAULT_MARKET_TAKER_FEE: U256 = MAX_MARKET_TAKER_FEE;

/// Deployment default referral bonus (50 %)
pub const DEFAULT_REFERRAL_BONUS: U256 = U256::from_limbs([500_000_000_000_000_000, 0, 0, 0]);

/// `floor(amount * fraction / FEE_UNIT)` without overflowing on the
/// intermediate product when `fraction <= FEE_UNIT`.
fn apply_fraction(amount: U256, fraction: U256) -> Option<U256> {
    let whole = amount / FEE_UNIT;
    let rest = amount % FEE_UNIT;
    let high = whole.checked_mul(fraction)?;
    let low = rest.checked_mul(fraction)? / FEE_UNIT;
    high.checked_add(low)
}

/// Largest fee a taker may be charged for a trade of `ether_value` at
/// `taker_fee_rate`, rounded down.
pub fn max_taker_fee(ether_value: U256, taker_fee_rate: U256) -> Result<U256, FeeError> {
    apply_fraction(ether_value, taker_fee_rate).ok_or(FeeError::Overflow)
}

/// Result of splitting a fee between admin and referrer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub admin_share: U256,
    pub referrer_share: U256,
}

/// Split `fee` so that the referrer gets `floor(fee * bonus / FEE_UNIT)` and
/// the admin gets the remainder. The two shares always sum to `fee`.
pub fn split_fee(fee: U256, referral_bonus: U256) -> Result<FeeSplit, FeeError> {
    if referral_bonus > MAX_REFERRAL_BONUS {
        return Err(FeeError::BonusTooHigh {
            share: referral_bonus,
        });
    }
    let referrer_share = apply_fraction(fee, referral_bonus).ok_or(FeeError::Overflow)?;
    let admin_share = fee
        .checked_sub(referrer_share)
        .ok_or(FeeError::Overflow)?;
    Ok(FeeSplit {
        admin_share,
        referrer_share,
    })
}
