//! External token boundary
//!
//! The exchange never owns token balances outside its ledger; it moves real
//! tokens through the token contract's `transfer` / `transfer_from`. Any
//! rejection, whether an error or a `false` return, fails the enclosing call.

use alloy_primitives::{Address, U256};
use std::collections::HashMap;
use tracing::trace;

use crate::errors::TokenError;

/// Standard fungible token interface seen by the exchange.
pub trait TokenContract {
    /// Address the token is deployed at. Ledger token balances are keyed by it.
    fn address(&self) -> Address;

    fn balance_of(&self, account: Address) -> U256;

    fn allowance(&self, owner: Address, spender: Address) -> U256;

    fn approve(
        &mut self,
        msg_sender: &Address,
        spender: Address,
        amount: U256,
    ) -> Result<bool, TokenError>;

    fn transfer(
        &mut self,
        msg_sender: &Address,
        to: Address,
        amount: U256,
    ) -> Result<bool, TokenError>;

    fn transfer_from(
        &mut self,
        msg_sender: &Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<bool, TokenError>;
}

/// In-memory ERC-20 with the whole supply minted to the deployer.
#[derive(Debug, Clone)]
pub struct TestToken {
    address: Address,
    name: String,
    symbol: String,
    decimals: u8,
    total_supply: U256,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
}

impl TestToken {
    pub fn new(
        address: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        total_supply: U256,
        deployer: Address,
    ) -> Self {
        let name = name.into();
        trace!(%name, %address, %total_supply, "Deploying test token");
        let mut balances = HashMap::new();
        balances.insert(deployer, total_supply);
        Self {
            address,
            name,
            symbol: symbol.into(),
            decimals,
            total_supply,
            balances,
            allowances: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: U256) -> Result<(), TokenError> {
        let from_balance = self.balance_of(from);
        let new_from_balance =
            from_balance
                .checked_sub(amount)
                .ok_or(TokenError::InsufficientBalance {
                    required: amount,
                    available: from_balance,
                })?;
        self.balances.insert(from, new_from_balance);

        let to_balance = self.balance_of(to);
        let new_to_balance = to_balance.checked_add(amount).ok_or(TokenError::Overflow)?;
        self.balances.insert(to, new_to_balance);
        Ok(())
    }
}

impl TokenContract for TestToken {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn approve(
        &mut self,
        msg_sender: &Address,
        spender: Address,
        amount: U256,
    ) -> Result<bool, TokenError> {
        self.allowances.insert((*msg_sender, spender), amount);
        Ok(true)
    }

    fn transfer(
        &mut self,
        msg_sender: &Address,
        to: Address,
        amount: U256,
    ) -> Result<bool, TokenError> {
        trace!(%msg_sender, %to, %amount, "transferring test token");
        self.move_balance(*msg_sender, to, amount)?;
        Ok(true)
    }

    fn transfer_from(
        &mut self,
        msg_sender: &Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<bool, TokenError> {
        let allowed = self.allowance(from, *msg_sender);
        if amount > allowed {
            return Err(TokenError::InsufficientAllowance {
                required: amount,
                available: allowed,
            });
        }
        if amount > self.balance_of(from) {
            return Err(TokenError::InsufficientBalance {
                required: amount,
                available: self.balance_of(from),
            });
        }

        if allowed != U256::MAX {
            self.allowances.insert((from, *msg_sender), allowed - amount);
        }
        self.move_balance(from, to, amount)?;
        Ok(true)
    }
}
