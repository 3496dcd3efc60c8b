//! Balance Ledger — custodial ether and token balances
//!
//! - Ether balance per account, token balance per (token, account)
//! - Deposit / withdraw against real funds (attached ether or the token contract)
//! - Checked credit / debit used by settlement
//! - Undo journal so a multi-step settlement can be rolled back as a whole
//!
//! Custody totals (`ether_reserve`, `token_reserve`) move only on deposits and
//! withdrawals; internal transfers leave them unchanged.

use alloy_primitives::{Address, U256};
use std::collections::HashMap;
use tracing::debug;

use crate::errors::LedgerError;
use crate::events::{DepositEther, DepositTokens, WithdrawEther, WithdrawTokens};
use crate::token::TokenContract;

/// Asset label used in `InsufficientFunds` errors for ether.
pub const ETHER: &str = "ETH";

/// A single balance slot in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BalanceKey {
    Ether(Address),
    Token { token: Address, user: Address },
}

impl BalanceKey {
    fn asset(&self) -> String {
        match self {
            BalanceKey::Ether(_) => ETHER.to_string(),
            BalanceKey::Token { token, .. } => token.to_string(),
        }
    }
}

/// Custodial balance book.
#[derive(Debug, Default)]
pub struct Ledger {
    ether: HashMap<Address, U256>,
    tokens: HashMap<(Address, Address), U256>,
    ether_reserve: U256,
    token_reserves: HashMap<Address, U256>,
    /// Previous values of every slot written since `begin`, oldest first
    journal: Option<Vec<(BalanceKey, U256)>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn ether_balance(&self, user: &Address) -> U256 {
        self.ether.get(user).copied().unwrap_or_default()
    }

    pub fn token_balance(&self, token: &Address, user: &Address) -> U256 {
        self.tokens
            .get(&(*token, *user))
            .copied()
            .unwrap_or_default()
    }

    pub fn balance(&self, key: BalanceKey) -> U256 {
        match key {
            BalanceKey::Ether(user) => self.ether_balance(&user),
            BalanceKey::Token { token, user } => self.token_balance(&token, &user),
        }
    }

    /// Total ether held in custody for all accounts.
    pub fn ether_reserve(&self) -> U256 {
        self.ether_reserve
    }

    /// Total amount of `token` held in custody for all accounts.
    pub fn token_reserve(&self, token: &Address) -> U256 {
        self.token_reserves.get(token).copied().unwrap_or_default()
    }

    /// Sum of all ledger ether balances. Equals `ether_reserve` at rest.
    pub fn total_ether(&self) -> U256 {
        self.ether.values().fold(U256::ZERO, |acc, b| acc.saturating_add(*b))
    }

    /// Sum of all ledger balances of `token`. Equals `token_reserve` at rest.
    pub fn total_tokens(&self, token: &Address) -> U256 {
        self.tokens
            .iter()
            .filter(|((t, _), _)| t == token)
            .fold(U256::ZERO, |acc, (_, b)| acc.saturating_add(*b))
    }

    // ───────────────────────── Ether ─────────────────────────

    /// Credit `amount` of ether attached to the call to `user`.
    pub fn deposit_ether(&mut self, user: Address, amount: U256) -> Result<DepositEther, LedgerError> {
        let reserve = self
            .ether_reserve
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance = self.credit(BalanceKey::Ether(user), amount)?;
        self.ether_reserve = reserve;

        debug!(%user, %amount, %balance, "ether deposited");
        Ok(DepositEther {
            user,
            amount,
            balance,
        })
    }

    /// Debit `amount` from `user` and release it from custody.
    pub fn withdraw_ether(&mut self, user: Address, amount: U256) -> Result<WithdrawEther, LedgerError> {
        let balance = self.debit(BalanceKey::Ether(user), amount)?;
        self.ether_reserve = self.ether_reserve.saturating_sub(amount);

        debug!(%user, %amount, %balance, "ether withdrawn");
        Ok(WithdrawEther {
            user,
            amount,
            balance,
        })
    }

    // ───────────────────────── Tokens ─────────────────────────

    /// Pull `amount` of `token` from `user` into custody of `custodian`
    /// (the exchange address) and credit the ledger.
    ///
    /// The user must have approved `custodian` on the token contract.
    pub fn deposit_tokens<T: TokenContract + ?Sized>(
        &mut self,
        custodian: Address,
        user: Address,
        token: &mut T,
        amount: U256,
    ) -> Result<DepositTokens, LedgerError> {
        let token_address = token.address();
        let key = BalanceKey::Token {
            token: token_address,
            user,
        };
        // Validate the credit before touching the token contract.
        let balance = self
            .balance(key)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let reserve = self
            .token_reserve(&token_address)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        expect_accepted(
            token_address,
            token.transfer_from(&custodian, user, custodian, amount),
        )?;

        self.write(key, balance);
        self.token_reserves.insert(token_address, reserve);

        debug!(token = %token_address, %user, %amount, %balance, "tokens deposited");
        Ok(DepositTokens {
            token: token_address,
            user,
            amount,
            balance,
        })
    }

    /// Debit `amount` of `token` from `user` and send it back through the
    /// token contract.
    pub fn withdraw_tokens<T: TokenContract + ?Sized>(
        &mut self,
        custodian: Address,
        user: Address,
        token: &mut T,
        amount: U256,
    ) -> Result<WithdrawTokens, LedgerError> {
        let token_address = token.address();
        let key = BalanceKey::Token {
            token: token_address,
            user,
        };
        let available = self.balance(key);
        let balance = available
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientFunds {
                asset: key.asset(),
                required: amount,
                available,
            })?;

        expect_accepted(token_address, token.transfer(&custodian, user, amount))?;

        self.write(key, balance);
        let reserve = self.token_reserve(&token_address).saturating_sub(amount);
        self.token_reserves.insert(token_address, reserve);

        debug!(token = %token_address, %user, %amount, %balance, "tokens withdrawn");
        Ok(WithdrawTokens {
            token: token_address,
            user,
            amount,
            balance,
        })
    }

    // ───────────────────────── Safe Transfer ─────────────────────────

    /// Add `amount` to a slot with overflow protection. Returns the new balance.
    pub(crate) fn credit(&mut self, key: BalanceKey, amount: U256) -> Result<U256, LedgerError> {
        let balance = self
            .balance(key)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.write(key, balance);
        Ok(balance)
    }

    /// Subtract `amount` from a slot with underflow protection. Returns the new balance.
    pub(crate) fn debit(&mut self, key: BalanceKey, amount: U256) -> Result<U256, LedgerError> {
        let available = self.balance(key);
        let balance = available
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientFunds {
                asset: key.asset(),
                required: amount,
                available,
            })?;
        self.write(key, balance);
        Ok(balance)
    }

    /// Move `amount` between two slots of the same asset.
    pub(crate) fn transfer(
        &mut self,
        from: BalanceKey,
        to: BalanceKey,
        amount: U256,
    ) -> Result<(), LedgerError> {
        self.debit(from, amount)?;
        self.credit(to, amount)?;
        Ok(())
    }

    fn write(&mut self, key: BalanceKey, value: U256) {
        if let Some(journal) = self.journal.as_mut() {
            let previous = match key {
                BalanceKey::Ether(user) => self.ether.get(&user).copied().unwrap_or_default(),
                BalanceKey::Token { token, user } => {
                    self.tokens.get(&(token, user)).copied().unwrap_or_default()
                }
            };
            journal.push((key, previous));
        }
        match key {
            BalanceKey::Ether(user) => {
                self.ether.insert(user, value);
            }
            BalanceKey::Token { token, user } => {
                self.tokens.insert((token, user), value);
            }
        }
    }

    // ───────────────────────── Journal ─────────────────────────

    /// Start recording slot writes. Nested journals are not supported.
    pub(crate) fn begin(&mut self) {
        debug_assert!(self.journal.is_none(), "ledger journal already open");
        self.journal = Some(Vec::new());
    }

    /// Keep every write made since `begin`.
    pub(crate) fn commit(&mut self) {
        self.journal = None;
    }

    /// Undo every write made since `begin`, newest first.
    pub(crate) fn rollback(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };
        for (key, previous) in journal.into_iter().rev() {
            self.write(key, previous);
        }
    }
}

fn expect_accepted<E: std::fmt::Display>(
    token: Address,
    outcome: Result<bool, E>,
) -> Result<(), LedgerError> {
    match outcome {
        Ok(true) => Ok(()),
        Ok(false) => Err(LedgerError::ExternalTransferFailed {
            token,
            reason: "transfer returned false".to_string(),
        }),
        Err(err) => Err(LedgerError::ExternalTransferFailed {
            token,
            reason: err.to_string(),
        }),
    }
}
