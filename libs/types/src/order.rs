//! Order terms and signatures
//!
//! An order is never stored by the exchange. The maker signs the canonical
//! hash of its terms off-chain; at fill time the taker resubmits the terms
//! together with the signature and the exchange rebuilds the hash.

use alloy_primitives::{keccak256, Address, Signature, B256, U256, U512};
use serde::{Deserialize, Serialize};

use crate::errors::OrderError;

/// Direction of an order, from the maker's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Maker sells `token` for ether
    SellTokens,
    /// Maker buys `token` with ether
    BuyTokens,
}

impl OrderType {
    /// Wire id used in the canonical order encoding
    pub fn id(&self) -> u8 {
        match self {
            OrderType::SellTokens => 1,
            OrderType::BuyTokens => 2,
        }
    }
}

impl TryFrom<u8> for OrderType {
    type Error = OrderError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(OrderType::SellTokens),
            2 => Ok(OrderType::BuyTokens),
            other => Err(OrderError::UnknownOrderType(other)),
        }
    }
}

/// Terms of an order as signed by the maker.
///
/// `token_amount` is the maximum fillable amount; `ether_amount` is the
/// ether exchanged for the whole `token_amount`, which fixes the price.
/// `nonce` only distinguishes otherwise identical orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    pub maker: Address,
    pub order_type: OrderType,
    pub token: Address,
    pub token_amount: U256,
    pub ether_amount: U256,
    pub expiration_block: u64,
    pub nonce: U256,
}

impl Order {
    /// Canonical packed encoding of the order terms bound to `exchange`.
    ///
    /// Layout (big-endian, no padding between fields):
    /// `exchange(20) | maker(20) | type(1) | token(20) | token_amount(32) |
    /// ether_amount(32) | expiration_block(32) | nonce(32)`
    pub fn canonical_bytes(&self, exchange: Address) -> Vec<u8> {
        let mut buf = Vec::with_capacity(20 * 3 + 1 + 32 * 4);
        buf.extend_from_slice(exchange.as_slice());
        buf.extend_from_slice(self.maker.as_slice());
        buf.push(self.order_type.id());
        buf.extend_from_slice(self.token.as_slice());
        buf.extend_from_slice(&self.token_amount.to_be_bytes::<32>());
        buf.extend_from_slice(&self.ether_amount.to_be_bytes::<32>());
        buf.extend_from_slice(&U256::from(self.expiration_block).to_be_bytes::<32>());
        buf.extend_from_slice(&self.nonce.to_be_bytes::<32>());
        buf
    }

    /// Keccak-256 of the canonical encoding. This is the order's identity
    /// for fill tracking and the digest the maker signs.
    pub fn hash(&self, exchange: Address) -> B256 {
        keccak256(self.canonical_bytes(exchange))
    }

    /// Ether exchanged for `fill_amount` tokens at the order's price,
    /// rounded down. The product is taken at 512 bits so only a quotient
    /// that does not fit in 256 bits is rejected.
    pub fn ether_value(&self, fill_amount: U256) -> Option<U256> {
        if self.token_amount.is_zero() {
            return None;
        }
        let product: U512 = self.ether_amount.widening_mul(fill_amount);
        let quotient = product / U512::from_limbs_slice(self.token_amount.as_limbs());
        U256::checked_from_limbs_slice(quotient.as_limbs())
    }
}

/// Recoverable ECDSA signature in `(v, r, s)` form, `v ∈ {27, 28}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderSignature {
    pub v: u8,
    pub r: B256,
    pub s: B256,
}

impl OrderSignature {
    pub fn new(v: u8, r: B256, s: B256) -> Self {
        Self { v, r, s }
    }

    /// Parse the 65-byte `r | s | v` layout produced by wallet `eth_sign`.
    /// A recovery byte below 27 is shifted into the 27/28 range.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, OrderError> {
        if bytes.len() != 65 {
            return Err(OrderError::InvalidSignatureLength(bytes.len()));
        }
        let r = B256::from_slice(&bytes[0..32]);
        let s = B256::from_slice(&bytes[32..64]);
        let mut v = bytes[64];
        if v < 27 {
            v += 27;
        }
        Ok(Self { v, r, s })
    }
}

impl From<Signature> for OrderSignature {
    fn from(sig: Signature) -> Self {
        Self {
            v: 27 + sig.v() as u8,
            r: B256::from(sig.r().to_be_bytes::<32>()),
            s: B256::from(sig.s().to_be_bytes::<32>()),
        }
    }
}

/// Order terms together with the maker's signature over their hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOrder {
    pub order: Order,
    pub signature: OrderSignature,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> Order {
        Order {
            maker: Address::repeat_byte(0x11),
            order_type: OrderType::SellTokens,
            token: Address::repeat_byte(0x22),
            token_amount: U256::from(10),
            ether_amount: U256::from(9000),
            expiration_block: 1_000,
            nonce: U256::from(1),
        }
    }

    #[test]
    fn test_order_type_ids() {
        assert_eq!(OrderType::SellTokens.id(), 1);
        assert_eq!(OrderType::BuyTokens.id(), 2);
        assert_eq!(OrderType::try_from(2), Ok(OrderType::BuyTokens));
        assert_eq!(OrderType::try_from(0), Err(OrderError::UnknownOrderType(0)));
    }

    #[test]
    fn test_canonical_bytes_length() {
        let order = sample_order();
        assert_eq!(order.canonical_bytes(Address::ZERO).len(), 189);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let exchange = Address::repeat_byte(0xee);
        assert_eq!(sample_order().hash(exchange), sample_order().hash(exchange));
    }

    #[test]
    fn test_hash_binds_every_field() {
        let exchange = Address::repeat_byte(0xee);
        let base = sample_order().hash(exchange);

        let mut o = sample_order();
        o.maker = Address::repeat_byte(0x12);
        assert_ne!(o.hash(exchange), base);

        let mut o = sample_order();
        o.order_type = OrderType::BuyTokens;
        assert_ne!(o.hash(exchange), base);

        let mut o = sample_order();
        o.token = Address::repeat_byte(0x23);
        assert_ne!(o.hash(exchange), base);

        let mut o = sample_order();
        o.token_amount = U256::from(11);
        assert_ne!(o.hash(exchange), base);

        let mut o = sample_order();
        o.ether_amount = U256::from(9001);
        assert_ne!(o.hash(exchange), base);

        let mut o = sample_order();
        o.expiration_block = 1_001;
        assert_ne!(o.hash(exchange), base);

        let mut o = sample_order();
        o.nonce = U256::from(2);
        assert_ne!(o.hash(exchange), base);
    }

    #[test]
    fn test_hash_bound_to_exchange() {
        let order = sample_order();
        assert_ne!(
            order.hash(Address::repeat_byte(0x01)),
            order.hash(Address::repeat_byte(0x02))
        );
    }

    #[test]
    fn test_ether_value_rounds_down() {
        let order = sample_order();
        assert_eq!(order.ether_value(U256::from(10)), Some(U256::from(9000)));
        assert_eq!(order.ether_value(U256::from(3)), Some(U256::from(2700)));

        let mut odd = sample_order();
        odd.ether_amount = U256::from(10);
        odd.token_amount = U256::from(3);
        assert_eq!(odd.ether_value(U256::from(1)), Some(U256::from(3)));
        assert_eq!(odd.ether_value(U256::ZERO), Some(U256::ZERO));
    }

    #[test]
    fn test_ether_value_wide_intermediate_product() {
        let mut order = sample_order();
        order.ether_amount = U256::MAX / U256::from(2);
        order.token_amount = U256::from(3);
        assert_eq!(order.ether_value(U256::from(3)), Some(U256::MAX / U256::from(2)));
        assert_eq!(
            order.ether_value(U256::from(2)),
            Some((U256::MAX / U256::from(2)) / U256::from(3) * U256::from(2))
        );

        order.ether_amount = U256::MAX;
        order.token_amount = U256::MAX;
        assert_eq!(order.ether_value(U256::MAX), Some(U256::MAX));
    }

    #[test]
    fn test_ether_value_quotient_too_wide() {
        let mut order = sample_order();
        order.ether_amount = U256::MAX;
        order.token_amount = U256::from(1);
        assert_eq!(order.ether_value(U256::from(2)), None);

        order.token_amount = U256::ZERO;
        assert_eq!(order.ether_value(U256::from(1)), None);
    }

    #[test]
    fn test_signature_from_bytes_normalizes_v() {
        let mut raw = [0u8; 65];
        raw[0] = 0xaa;
        raw[32] = 0xbb;
        raw[64] = 1;
        let sig = OrderSignature::from_bytes(&raw).unwrap();
        assert_eq!(sig.v, 28);
        assert_eq!(sig.r[0], 0xaa);
        assert_eq!(sig.s[0], 0xbb);

        raw[64] = 27;
        assert_eq!(OrderSignature::from_bytes(&raw).unwrap().v, 27);
    }

    #[test]
    fn test_signature_from_bytes_wrong_length() {
        assert_eq!(
            OrderSignature::from_bytes(&[0u8; 64]),
            Err(OrderError::InvalidSignatureLength(64))
        );
    }

    #[test]
    fn test_signed_order_serialization() {
        let signed = SignedOrder {
            order: sample_order(),
            signature: OrderSignature::new(27, B256::repeat_byte(1), B256::repeat_byte(2)),
        };
        let json = serde_json::to_string(&signed).unwrap();
        let deser: SignedOrder = serde_json::from_str(&json).unwrap();
        assert_eq!(signed, deser);
        assert!(json.contains("SELL_TOKENS"));
    }
}
