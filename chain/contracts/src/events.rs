//! Contract events
//!
//! Events are immutable records emitted by successful contract operations.
//! A failed call emits nothing.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Ether credited to a user's ledger balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositEther {
    pub user: Address,
    pub amount: U256,
    /// Ledger balance after the deposit
    pub balance: U256,
}

/// Ether released from a user's ledger balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawEther {
    pub user: Address,
    pub amount: U256,
    pub balance: U256,
}

/// Tokens pulled from the token contract into the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositTokens {
    pub token: Address,
    pub user: Address,
    pub amount: U256,
    pub balance: U256,
}

/// Tokens pushed back to the user through the token contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawTokens {
    pub token: Address,
    pub user: Address,
    pub amount: U256,
    pub balance: U256,
}

/// Part of a maker's order was consumed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillOrder {
    /// The maker
    pub user: Address,
    pub hash: B256,
    pub amount: U256,
}

/// A maker permanently blocked one of its orders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub user: Address,
    pub hash: B256,
}

/// A user nominated its referrer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetReferrer {
    pub user: Address,
    pub referrer: Address,
}

/// Fee credited to the admin or a referrer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFee {
    /// Recipient of the fee share
    pub user: Address,
    pub amount: U256,
}

/// Enum wrapper for all contract events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    DepositEther(DepositEther),
    WithdrawEther(WithdrawEther),
    DepositTokens(DepositTokens),
    WithdrawTokens(WithdrawTokens),
    FillOrder(FillOrder),
    CancelOrder(CancelOrder),
    SetReferrer(SetReferrer),
    TransferFee(TransferFee),
}

impl ContractEvent {
    /// Event name as it appears in logs
    pub fn name(&self) -> &'static str {
        match self {
            ContractEvent::DepositEther(_) => "DepositEther",
            ContractEvent::WithdrawEther(_) => "WithdrawEther",
            ContractEvent::DepositTokens(_) => "DepositTokens",
            ContractEvent::WithdrawTokens(_) => "WithdrawTokens",
            ContractEvent::FillOrder(_) => "FillOrder",
            ContractEvent::CancelOrder(_) => "CancelOrder",
            ContractEvent::SetReferrer(_) => "SetReferrer",
            ContractEvent::TransferFee(_) => "TransferFee",
        }
    }
}

macro_rules! impl_from_event {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for ContractEvent {
                fn from(event: $variant) -> Self {
                    ContractEvent::$variant(event)
                }
            }
        )*
    };
}

impl_from_event!(
    DepositEther,
    WithdrawEther,
    DepositTokens,
    WithdrawTokens,
    FillOrder,
    CancelOrder,
    SetReferrer,
    TransferFee,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_ether_serialization() {
        let event = DepositEther {
            user: Address::repeat_byte(6),
            amount: U256::from(1234),
            balance: U256::from(1234),
        };
        let json = serde_json::to_string(&event).unwrap();
        let deser: DepositEther = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_contract_event_from_and_name() {
        let event: ContractEvent = CancelOrder {
            user: Address::repeat_byte(6),
            hash: B256::ZERO,
        }
        .into();
        assert!(matches!(event, ContractEvent::CancelOrder(_)));
        assert_eq!(event.name(), "CancelOrder");
    }

    #[test]
    fn test_transfer_fee_roundtrip_through_enum() {
        let event = ContractEvent::TransferFee(TransferFee {
            user: Address::repeat_byte(1),
            amount: U256::from(2),
        });
        let json = serde_json::to_string(&event).unwrap();
        let deser: ContractEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }
}
