//! In-memory share book.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tidepool_core::{Address, U256};

use super::store::{SharesReader, SharesWriter};

/// Share balances backed by an ordered map.
///
/// Zero balances are removed on write so two books with the same
/// balances serialize to the same bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharesBook {
    shares: BTreeMap<Address, U256>,
    total_shares: U256,
}

impl SharesBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accounts with a non-zero balance, in address order.
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &U256)> {
        self.shares.iter()
    }

    /// Number of accounts with a non-zero balance.
    pub fn holder_count(&self) -> usize {
        self.shares.len()
    }
}

impl SharesReader for SharesBook {
    fn shares_of(&self, account: &Address) -> U256 {
        self.shares.get(account).copied().unwrap_or_default()
    }

    fn total_shares(&self) -> U256 {
        self.total_shares
    }
}

impl SharesWriter for SharesBook {
    fn set_shares(&mut self, account: &Address, shares: U256) {
        if shares.is_zero() {
            self.shares.remove(account);
        } else {
            self.shares.insert(*account, shares);
        }
    }

    fn set_total_shares(&mut self, total: U256) {
        self.total_shares = total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidepool_core::derive_address;

    #[test]
    fn test_missing_account_is_zero() {
        let book = SharesBook::new();
        assert!(book.shares_of(&derive_address("nobody")).is_zero());
        assert_eq!(book.holder_count(), 0);
    }

    #[test]
    fn test_zero_write_removes_entry() {
        let mut book = SharesBook::new();
        let alice = derive_address("alice");
        book.set_shares(&alice, U256::from(5u64));
        assert_eq!(book.holder_count(), 1);
        book.set_shares(&alice, U256::zero());
        assert_eq!(book.holder_count(), 0);
    }

    #[test]
    fn test_holders_are_ordered() {
        let mut book = SharesBook::new();
        for label in ["carol", "alice", "bob"] {
            book.set_shares(&derive_address(label), U256::one());
        }
        let addresses: Vec<Address> = book.holders().map(|(a, _)| *a).collect();
        let mut sorted = addresses.clone();
        sorted.sort();
        assert_eq!(addresses, sorted);
    }
}
