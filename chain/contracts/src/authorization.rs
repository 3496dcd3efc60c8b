//! Order Authorization — order hash, signer recovery, expiration
//!
//! Makers sign the order hash with the wallet `personal_sign` convention:
//! the digest actually signed is
//! `keccak256("\x19Ethereum Signed Message:\n32" ++ order_hash)`.

use alloy_primitives::{eip191_hash_message, uint, Address, Signature, B256, U256};
use panther_types::order::{Order, OrderSignature};
use tracing::trace;

use crate::errors::ExchangeError;

/// Half the secp256k1 group order; signatures with a larger `s` are malleable.
const SECP256K1N_HALF: U256 =
    uint!(0x7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0_U256);

/// Hash of an order's canonical fields, bound to the settling exchange.
pub fn hash_order(exchange: Address, order: &Order) -> B256 {
    order.hash(exchange)
}

/// Digest a wallet signs when asked to sign the 32-byte `hash`.
pub fn signed_message_hash(hash: B256) -> B256 {
    eip191_hash_message(hash)
}

/// Recover the address whose key produced `signature` over the signed-message
/// encoding of `hash`.
///
/// Accepts `v ∈ {27, 28}` (and the raw parities `0`, `1`), and rejects high-s
/// signatures.
pub fn recover_address(hash: B256, signature: &OrderSignature) -> Result<Address, ExchangeError> {
    let parity = match signature.v {
        27 | 0 => false,
        28 | 1 => true,
        _ => return Err(ExchangeError::InvalidSignature),
    };

    let r = U256::from_be_slice(signature.r.as_slice());
    let s = U256::from_be_slice(signature.s.as_slice());
    if s > SECP256K1N_HALF {
        return Err(ExchangeError::InvalidSignature);
    }

    let digest = signed_message_hash(hash);
    let signer = Signature::new(r, s, parity)
        .recover_address_from_prehash(&digest)
        .map_err(|_| ExchangeError::InvalidSignature)?;

    trace!(%hash, %signer, "recovered signer");
    Ok(signer)
}

/// True iff `signature` over `hash` recovers to `signer`.
pub fn is_signature_valid(signer: Address, hash: B256, signature: &OrderSignature) -> bool {
    recover_address(hash, signature).is_ok_and(|recovered| recovered == signer)
}

/// True iff `current_block` is strictly below `expiration_block`.
pub fn is_not_expired(expiration_block: u64, current_block: u64) -> bool {
    current_block < expiration_block
}
