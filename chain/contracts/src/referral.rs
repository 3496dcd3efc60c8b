//! Referral book — referrer links and first-transaction status
//!
//! A user may name a referrer at most once, and only someone who has already
//! made a qualifying transaction can be named. Ineligible requests are
//! silent no-ops.

use alloy_primitives::Address;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::events::SetReferrer;

#[derive(Debug, Default)]
pub struct ReferralBook {
    referrers: HashMap<Address, Address>,
    first_transaction_done: HashSet<Address>,
}

impl ReferralBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn referrer_of(&self, user: &Address) -> Option<Address> {
        self.referrers.get(user).copied()
    }

    pub fn first_valid_transaction_done(&self, user: &Address) -> bool {
        self.first_transaction_done.contains(user)
    }

    /// Record that `user` completed a qualifying transaction. Idempotent.
    pub fn mark_first_transaction(&mut self, user: Address) {
        if self.first_transaction_done.insert(user) {
            debug!(%user, "first valid transaction done");
        }
    }

    /// Link `user` to `candidate` if `user` has no referrer yet and
    /// `candidate` already qualifies. The call itself qualifies `user`.
    ///
    /// Returns the event when the link was recorded.
    pub fn set_referrer(&mut self, user: Address, candidate: Address) -> Option<SetReferrer> {
        let eligible = !self.referrers.contains_key(&user)
            && candidate != Address::ZERO
            && candidate != user
            && self.first_valid_transaction_done(&candidate);

        self.mark_first_transaction(user);

        if !eligible {
            debug!(%user, %candidate, "referrer not set");
            return None;
        }

        self.referrers.insert(user, candidate);
        debug!(%user, referrer = %candidate, "referrer set");
        Some(SetReferrer {
            user,
            referrer: candidate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    #[test]
    fn test_set_referrer_walkthrough() {
        let mut book = ReferralBook::new();
        let (u1, u2, u3, u4) = (user(1), user(2), user(3), user(4));

        // u1 has no qualifying transaction yet
        assert!(!book.first_valid_transaction_done(&u1));
        assert_eq!(book.set_referrer(u2, u1), None);
        assert_eq!(book.referrer_of(&u2), None);

        // the attempt itself qualified u2
        assert!(book.first_valid_transaction_done(&u2));
        book.set_referrer(u4, u1);
        assert!(book.first_valid_transaction_done(&u4));

        let event = book.set_referrer(u3, u2).unwrap();
        assert_eq!(event.user, u3);
        assert_eq!(event.referrer, u2);
        assert_eq!(book.referrer_of(&u3), Some(u2));

        // the link is immutable
        assert_eq!(book.set_referrer(u3, u4), None);
        assert_eq!(book.referrer_of(&u3), Some(u2));
    }

    #[test]
    fn test_self_referral_ignored() {
        let mut book = ReferralBook::new();
        book.mark_first_transaction(user(1));
        assert_eq!(book.set_referrer(user(1), user(1)), None);
        assert_eq!(book.referrer_of(&user(1)), None);
    }

    #[test]
    fn test_zero_address_ignored() {
        let mut book = ReferralBook::new();
        book.mark_first_transaction(Address::ZERO);
        assert_eq!(book.set_referrer(user(1), Address::ZERO), None);
    }

    #[test]
    fn test_referrer_can_be_set_after_other_transactions() {
        let mut book = ReferralBook::new();
        book.mark_first_transaction(user(1));
        book.mark_first_transaction(user(2));
        assert!(book.set_referrer(user(2), user(1)).is_some());
    }
}
