//! Settlement contract for peer-to-peer token/ether trading
//!
//! Users deposit ether and tokens into a custodial ledger, makers sign orders
//! off-chain, and takers fill them through the exchange, which swaps both
//! parties' balances atomically and splits the taker fee between the admin
//! and the taker's referrer.
//!
//! # Modules
//! - `errors`: Contract-specific error types
//! - `events`: Contract events
//! - `config`: Deployment configuration
//! - `admin`: Admin identity and bounded fee parameters
//! - `token`: External token contract boundary and an in-memory test token
//! - `ledger`: Custodial ether and token balances with an undo journal
//! - `authorization`: Order hash, signer recovery, expiration
//! - `fills`: Per-order filled amounts and cancellation
//! - `referral`: Referrer links and first-transaction status
//! - `exchange`: Settlement engine and public surface

pub mod admin;
pub mod authorization;
pub mod config;
pub mod errors;
pub mod events;
pub mod exchange;
pub mod fills;
pub mod ledger;
pub mod referral;
pub mod token;

pub use config::ExchangeConfig;
pub use errors::ExchangeError;
pub use exchange::Exchange;

/// Contract ABI version — frozen after release
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";
