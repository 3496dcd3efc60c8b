//! Exchange — settlement engine and public contract surface
//!
//! Ties together the balance ledger, order authorization, fill tracking,
//! referral book and administration. Every mutating entry point either
//! applies all of its balance changes and events or none of them:
//! ledger writes run inside an undo journal, events are staged and only
//! appended once the call has succeeded, and fill / referral updates happen
//! after the last fallible step.

use alloy_primitives::{Address, B256, U256};
use panther_types::fee::{max_taker_fee, split_fee};
use panther_types::order::{Order, OrderSignature, OrderType, SignedOrder};
use tracing::{debug, info, warn};

use crate::admin::AdminConfig;
use crate::authorization;
use crate::config::ExchangeConfig;
use crate::errors::ExchangeError;
use crate::events::{ContractEvent, SetReferrer, TransferFee};
use crate::fills::FillTracker;
use crate::ledger::{BalanceKey, Ledger};
use crate::referral::ReferralBook;
use crate::token::TokenContract;

/// Terms of a single settlement between a maker and a taker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Settlement {
    taker: Address,
    maker: Address,
    order_type: OrderType,
    token: Address,
    token_amount: U256,
    ether_value: U256,
    fee: U256,
}

#[derive(Debug)]
pub struct Exchange {
    /// Address the exchange is deployed at; bound into every order hash
    address: Address,
    admin: AdminConfig,
    ledger: Ledger,
    fills: FillTracker,
    referrals: ReferralBook,
    block_number: u64,
    /// Emitted events log (append-only)
    events: Vec<ContractEvent>,
}

impl Exchange {
    /// Deploy an exchange at `address`. Rejects out-of-range fee parameters.
    pub fn new(address: Address, config: ExchangeConfig) -> Result<Self, ExchangeError> {
        let admin = AdminConfig::new(&config).inspect_err(|err| {
            warn!(%address, error = %err, "exchange construction rejected");
        })?;
        info!(
            %address,
            admin = %config.admin,
            market_taker_fee = %config.market_taker_fee,
            referral_bonus = %config.referral_bonus,
            "exchange deployed"
        );
        Ok(Self {
            address,
            admin,
            ledger: Ledger::new(),
            fills: FillTracker::new(),
            referrals: ReferralBook::new(),
            block_number: config.start_block,
            events: Vec::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    // ───────────────────────── Balances ─────────────────────────

    /// Credit `amount` of ether sent along with the call.
    pub fn deposit_ether(&mut self, caller: Address, amount: U256) -> Result<(), ExchangeError> {
        let event = self
            .ledger
            .deposit_ether(caller, amount)
            .inspect_err(|err| warn!(%caller, %amount, error = %err, "ether deposit rejected"))?;
        self.emit(event);
        Ok(())
    }

    pub fn withdraw_ether(&mut self, caller: Address, amount: U256) -> Result<(), ExchangeError> {
        let event = self
            .ledger
            .withdraw_ether(caller, amount)
            .inspect_err(|err| warn!(%caller, %amount, error = %err, "ether withdrawal rejected"))?;
        self.emit(event);
        Ok(())
    }

    /// Pull `amount` of `token` from the caller. The caller must have
    /// approved the exchange address on the token beforehand.
    pub fn deposit_tokens<T: TokenContract + ?Sized>(
        &mut self,
        caller: Address,
        token: &mut T,
        amount: U256,
    ) -> Result<(), ExchangeError> {
        let event = self
            .ledger
            .deposit_tokens(self.address, caller, token, amount)
            .inspect_err(|err| warn!(%caller, %amount, error = %err, "token deposit rejected"))?;
        self.emit(event);
        Ok(())
    }

    pub fn withdraw_tokens<T: TokenContract + ?Sized>(
        &mut self,
        caller: Address,
        token: &mut T,
        amount: U256,
    ) -> Result<(), ExchangeError> {
        let event = self
            .ledger
            .withdraw_tokens(self.address, caller, token, amount)
            .inspect_err(|err| warn!(%caller, %amount, error = %err, "token withdrawal rejected"))?;
        self.emit(event);
        Ok(())
    }

    pub fn ether_balance(&self, user: &Address) -> U256 {
        self.ledger.ether_balance(user)
    }

    pub fn token_balance(&self, token: &Address, user: &Address) -> U256 {
        self.ledger.token_balance(token, user)
    }

    pub fn ether_reserve(&self) -> U256 {
        self.ledger.ether_reserve()
    }

    pub fn token_reserve(&self, token: &Address) -> U256 {
        self.ledger.token_reserve(token)
    }

    /// Read-only view of the ledger, for audits and invariant checks.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // ───────────────────────── Referrals ─────────────────────────

    /// Name `candidate` as the caller's referrer. Ineligible requests are
    /// silent no-ops; the returned event tells whether the link was recorded.
    pub fn set_referrer(&mut self, caller: Address, candidate: Address) -> Option<SetReferrer> {
        let event = self.referrals.set_referrer(caller, candidate)?;
        self.emit(event.clone());
        Some(event)
    }

    pub fn referrer_of(&self, user: &Address) -> Option<Address> {
        self.referrals.referrer_of(user)
    }

    pub fn first_valid_transaction_done(&self, user: &Address) -> bool {
        self.referrals.first_valid_transaction_done(user)
    }

    // ───────────────────────── Authorization ─────────────────────────

    /// Order hash bound to this exchange's address.
    pub fn hash_order(&self, order: &Order) -> B256 {
        authorization::hash_order(self.address, order)
    }

    pub fn recover_address(
        &self,
        hash: B256,
        signature: &OrderSignature,
    ) -> Result<Address, ExchangeError> {
        authorization::recover_address(hash, signature)
    }

    pub fn is_signature_valid(&self, signer: Address, hash: B256, signature: &OrderSignature) -> bool {
        authorization::is_signature_valid(signer, hash, signature)
    }

    /// True iff the current block is strictly below `expiration_block`.
    pub fn is_not_expired(&self, expiration_block: u64) -> bool {
        authorization::is_not_expired(expiration_block, self.block_number)
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    /// Move the block counter forward by `blocks`. Never moves backwards.
    pub fn advance_blocks(&mut self, blocks: u64) {
        self.block_number = self.block_number.saturating_add(blocks);
    }

    // ───────────────────────── Fill Tracking ─────────────────────────

    /// Record a fill of `amount` against an order authorized for `authorized`.
    /// Performs no signature check; only built with `unchecked-primitives`.
    #[cfg(any(test, feature = "unchecked-primitives"))]
    pub fn fill_order(
        &mut self,
        maker: Address,
        hash: B256,
        authorized: U256,
        amount: U256,
    ) -> Result<(), ExchangeError> {
        let event = self
            .fills
            .record_fill(maker, hash, authorized, amount)
            .inspect_err(|err| warn!(%maker, %hash, %amount, error = %err, "fill rejected"))?;
        debug!(%maker, %hash, %amount, "order filled");
        self.emit(event);
        Ok(())
    }

    /// Cancel one of the caller's own orders by hash. Orders are keyed by
    /// maker, so a caller can only ever cancel orders it made.
    pub fn cancel_order(&mut self, caller: Address, hash: B256) {
        let event = self.fills.cancel(caller, hash);
        debug!(maker = %caller, %hash, "order cancelled");
        self.emit(event);
    }

    /// Cancel an order by its terms. Only the maker may cancel.
    pub fn cancel_signed_order(
        &mut self,
        caller: Address,
        signed_order: &SignedOrder,
    ) -> Result<B256, ExchangeError> {
        if caller != signed_order.order.maker {
            warn!(%caller, maker = %signed_order.order.maker, "cancel by non-maker rejected");
            return Err(ExchangeError::Unauthorized { caller });
        }
        let hash = self.hash_order(&signed_order.order);
        self.cancel_order(caller, hash);
        Ok(hash)
    }

    /// Filled amount of an order; `U256::MAX` once cancelled.
    pub fn order_fills(&self, maker: &Address, hash: &B256) -> U256 {
        self.fills.filled(maker, hash)
    }

    pub fn remaining(&self, maker: &Address, hash: &B256, authorized: U256) -> U256 {
        self.fills.remaining(maker, hash, authorized)
    }

    // ───────────────────────── Settlement ─────────────────────────

    /// Swap balances between `taker` (the caller) and `maker` and charge the
    /// taker `fee`. Performs no signature, expiration or fill checks; only
    /// built with `unchecked-primitives`. Use [`Exchange::trade`] otherwise.
    #[cfg(any(test, feature = "unchecked-primitives"))]
    #[allow(clippy::too_many_arguments)]
    pub fn clear_user_balances(
        &mut self,
        taker: Address,
        maker: Address,
        order_type: OrderType,
        token: Address,
        token_amount: U256,
        ether_value: U256,
        fee: U256,
    ) -> Result<(), ExchangeError> {
        let settlement = Settlement {
            taker,
            maker,
            order_type,
            token,
            token_amount,
            ether_value,
            fee,
        };
        let staged = self
            .atomically(|exchange| exchange.settle(&settlement))
            .inspect_err(|err| warn!(%taker, %maker, error = %err, "settlement rejected"))?;

        self.referrals.mark_first_transaction(taker);
        self.emit_all(staged);
        Ok(())
    }

    /// Fill `fill_amount` of a signed order on behalf of `taker`.
    ///
    /// Verifies the maker's signature and the expiration block, checks the
    /// remaining amount, settles at the order's price and records the fill.
    /// Returns the order hash.
    pub fn trade(
        &mut self,
        taker: Address,
        signed_order: &SignedOrder,
        fill_amount: U256,
        fee: U256,
    ) -> Result<B256, ExchangeError> {
        let order = &signed_order.order;
        let hash = self.hash_order(order);

        let staged = self
            .authorize_and_settle(taker, signed_order, hash, fill_amount, fee)
            .inspect_err(|err| {
                warn!(%taker, maker = %order.maker, %hash, %fill_amount, error = %err, "trade rejected")
            })?;

        self.referrals.mark_first_transaction(taker);
        self.emit_all(staged);
        debug!(%taker, maker = %order.maker, %hash, %fill_amount, "trade settled");
        Ok(hash)
    }

    fn authorize_and_settle(
        &mut self,
        taker: Address,
        signed_order: &SignedOrder,
        hash: B256,
        fill_amount: U256,
        fee: U256,
    ) -> Result<Vec<ContractEvent>, ExchangeError> {
        let order = &signed_order.order;
        if order.token_amount.is_zero() {
            return Err(ExchangeError::InvalidOrder {
                reason: "token amount is zero".to_string(),
            });
        }
        if !self.is_signature_valid(order.maker, hash, &signed_order.signature) {
            return Err(ExchangeError::InvalidSignature);
        }
        if !self.is_not_expired(order.expiration_block) {
            return Err(ExchangeError::OrderExpired {
                expiration_block: order.expiration_block,
                current_block: self.block_number,
            });
        }
        self.fills
            .check_fill(&order.maker, &hash, order.token_amount, fill_amount)?;

        let ether_value = order.ether_value(fill_amount).ok_or(ExchangeError::Overflow)?;

        let settlement = Settlement {
            taker,
            maker: order.maker,
            order_type: order.order_type,
            token: order.token,
            token_amount: fill_amount,
            ether_value,
            fee,
        };
        self.atomically(|exchange| {
            let fee_events = exchange.settle(&settlement)?;
            let fill = exchange
                .fills
                .record_fill(order.maker, hash, order.token_amount, fill_amount)?;
            let mut staged = Vec::with_capacity(fee_events.len() + 1);
            staged.push(fill.into());
            staged.extend(fee_events);
            Ok(staged)
        })
    }

    /// Run `f` inside a ledger journal, undoing every ledger write if it fails.
    fn atomically<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ExchangeError>,
    ) -> Result<T, ExchangeError> {
        self.ledger.begin();
        match f(self) {
            Ok(value) => {
                self.ledger.commit();
                Ok(value)
            }
            Err(err) => {
                self.ledger.rollback();
                Err(err)
            }
        }
    }

    /// Ledger moves for one settlement. Must run inside `atomically`.
    fn settle(&mut self, s: &Settlement) -> Result<Vec<ContractEvent>, ExchangeError> {
        if s.taker == s.maker {
            return Err(ExchangeError::SelfTrade);
        }
        let fee_cap = max_taker_fee(s.ether_value, self.admin.market_taker_fee())?;
        if s.fee > fee_cap {
            return Err(ExchangeError::OutOfRange {
                parameter: "fee",
                value: s.fee,
                max: fee_cap,
            });
        }

        let taker_ether = BalanceKey::Ether(s.taker);
        let maker_ether = BalanceKey::Ether(s.maker);
        let taker_tokens = BalanceKey::Token {
            token: s.token,
            user: s.taker,
        };
        let maker_tokens = BalanceKey::Token {
            token: s.token,
            user: s.maker,
        };

        // The fee comes out of what the taker held before the trade.
        self.ledger.debit(taker_ether, s.fee)?;
        match s.order_type {
            OrderType::SellTokens => {
                self.ledger.transfer(maker_tokens, taker_tokens, s.token_amount)?;
                self.ledger.transfer(taker_ether, maker_ether, s.ether_value)?;
            }
            OrderType::BuyTokens => {
                self.ledger.transfer(taker_tokens, maker_tokens, s.token_amount)?;
                self.ledger.transfer(maker_ether, taker_ether, s.ether_value)?;
            }
        }
        debug!(
            taker = %s.taker,
            maker = %s.maker,
            order_type = ?s.order_type,
            token = %s.token,
            token_amount = %s.token_amount,
            ether_value = %s.ether_value,
            fee = %s.fee,
            "balances cleared"
        );

        self.transfer_fees(s.taker, s.fee)
    }

    /// Credit `fee` to the admin, less the referrer's share if the taker has one.
    fn transfer_fees(&mut self, taker: Address, fee: U256) -> Result<Vec<ContractEvent>, ExchangeError> {
        let admin = self.admin.admin();
        let Some(referrer) = self.referrals.referrer_of(&taker) else {
            self.ledger.credit(BalanceKey::Ether(admin), fee)?;
            debug!(%admin, amount = %fee, "fee transferred");
            return Ok(vec![TransferFee { user: admin, amount: fee }.into()]);
        };

        let split = split_fee(fee, self.admin.referral_bonus())?;
        self.ledger.credit(BalanceKey::Ether(admin), split.admin_share)?;
        self.ledger
            .credit(BalanceKey::Ether(referrer), split.referrer_share)?;
        debug!(
            %admin,
            %referrer,
            admin_share = %split.admin_share,
            referrer_share = %split.referrer_share,
            "fee transferred"
        );
        Ok(vec![
            TransferFee {
                user: admin,
                amount: split.admin_share,
            }
            .into(),
            TransferFee {
                user: referrer,
                amount: split.referrer_share,
            }
            .into(),
        ])
    }

    // ───────────────────────── Administration ─────────────────────────

    pub fn admin(&self) -> Address {
        self.admin.admin()
    }

    pub fn market_taker_fee(&self) -> U256 {
        self.admin.market_taker_fee()
    }

    pub fn referral_bonus(&self) -> U256 {
        self.admin.referral_bonus()
    }

    pub fn set_admin(&mut self, caller: Address, new_admin: Address) -> Result<(), ExchangeError> {
        self.admin
            .set_admin(&caller, new_admin)
            .inspect_err(|err| warn!(%caller, error = %err, "set_admin rejected"))
    }

    pub fn set_market_taker_fee(&mut self, caller: Address, rate: U256) -> Result<(), ExchangeError> {
        self.admin
            .set_market_taker_fee(&caller, rate)
            .inspect_err(|err| warn!(%caller, %rate, error = %err, "set_market_taker_fee rejected"))
    }

    pub fn set_referral_bonus(&mut self, caller: Address, share: U256) -> Result<(), ExchangeError> {
        self.admin
            .set_referral_bonus(&caller, share)
            .inspect_err(|err| warn!(%caller, %share, error = %err, "set_referral_bonus rejected"))
    }

    // ───────────────────────── Events ─────────────────────────

    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// Take every event emitted so far, leaving the log empty.
    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: impl Into<ContractEvent>) {
        self.events.push(event.into());
    }

    fn emit_all(&mut self, events: Vec<ContractEvent>) {
        self.events.extend(events);
    }
}
