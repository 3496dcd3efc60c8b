//! Types library for the settlement engine
//!
//! Value types shared between the on-chain settlement logic and any
//! off-chain component that builds and signs orders. Everything here is
//! pure: no state, no I/O.
//!
//! # Modules
//! - `order`: Order terms, order direction, signatures and the canonical order hash
//! - `fee`: Fee units, taker fee cap and the admin/referrer fee split
//! - `errors`: Error taxonomy for the pure arithmetic in this crate

pub mod errors;
pub mod fee;
pub mod order;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::errors::*;
    pub use crate::fee::*;
    pub use crate::order::*;
}
