//! Fill Tracker — cumulative filled amount per (maker, order hash)
//!
//! Each order is either `Open` with a monotonically growing filled amount or
//! `Cancelled`. Cancellation is terminal; no transition leaves it.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::ExchangeError;
use crate::events::{CancelOrder, FillOrder};

/// Fill state of a single order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillState {
    /// Accepting fills; carries the amount filled so far
    Open(U256),
    /// Permanently blocked by the maker
    Cancelled,
}

impl Default for FillState {
    fn default() -> Self {
        FillState::Open(U256::ZERO)
    }
}

#[derive(Debug, Default)]
pub struct FillTracker {
    fills: HashMap<(Address, B256), FillState>,
}

impl FillTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, maker: &Address, hash: &B256) -> FillState {
        self.fills.get(&(*maker, *hash)).copied().unwrap_or_default()
    }

    /// Filled amount as exposed to readers. A cancelled order reads as
    /// `U256::MAX`, so callers computing `authorized - filled` see nothing left.
    pub fn filled(&self, maker: &Address, hash: &B256) -> U256 {
        match self.state(maker, hash) {
            FillState::Open(filled) => filled,
            FillState::Cancelled => U256::MAX,
        }
    }

    /// Amount still fillable against `authorized`. Zero for cancelled orders
    /// and for orders already filled past `authorized`.
    pub fn remaining(&self, maker: &Address, hash: &B256, authorized: U256) -> U256 {
        match self.state(maker, hash) {
            FillState::Open(filled) => authorized.saturating_sub(filled),
            FillState::Cancelled => U256::ZERO,
        }
    }

    /// Check that `amount` fits and return the filled total it would produce.
    pub fn check_fill(
        &self,
        maker: &Address,
        hash: &B256,
        authorized: U256,
        amount: U256,
    ) -> Result<U256, ExchangeError> {
        let filled = match self.state(maker, hash) {
            FillState::Open(filled) => filled,
            FillState::Cancelled => {
                return Err(ExchangeError::OrderOverfill {
                    requested: amount,
                    remaining: U256::ZERO,
                })
            }
        };
        // A total already past `authorized` leaves nothing, not even a zero fill.
        let Some(remaining) = authorized.checked_sub(filled) else {
            return Err(ExchangeError::OrderOverfill {
                requested: amount,
                remaining: U256::ZERO,
            });
        };
        if amount > remaining {
            return Err(ExchangeError::OrderOverfill {
                requested: amount,
                remaining,
            });
        }
        Ok(filled + amount)
    }

    /// Add `amount` to the order's filled total if it fits within `authorized`.
    pub fn record_fill(
        &mut self,
        maker: Address,
        hash: B256,
        authorized: U256,
        amount: U256,
    ) -> Result<FillOrder, ExchangeError> {
        let filled = self.check_fill(&maker, &hash, authorized, amount)?;
        self.fills.insert((maker, hash), FillState::Open(filled));
        Ok(FillOrder {
            user: maker,
            hash,
            amount,
        })
    }

    /// Block the order forever. Cancelling twice is harmless.
    pub fn cancel(&mut self, maker: Address, hash: B256) -> CancelOrder {
        self.fills.insert((maker, hash), FillState::Cancelled);
        CancelOrder { user: maker, hash }
    }
}
