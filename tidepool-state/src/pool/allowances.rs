//! Value-denominated spending allowances.
//!
//! An allowance lets a spender move up to that much value out of the
//! owner's balance. `U256::MAX` is infinite and is never spent down.

use tidepool_core::{Address, U256};
use tracing::debug;

use super::Pool;
use crate::error::{StateError, StateResult};

impl Pool {
    pub fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    /// Set the spender's allowance over the owner's balance. Zero clears it.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: U256) {
        if amount.is_zero() {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
        debug!(%owner, %spender, %amount, "allowance set");
    }

    /// Value-denominated transfer on the owner's behalf. Returns the shares moved.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        value: U256,
    ) -> StateResult<U256> {
        let remaining = self.allowance_after_spend(&from, &spender, value)?;
        let shares = self.get_shares_by_pooled_eth(value)?;
        self.transfer_shares(from, to, shares)?;
        self.approve(from, spender, remaining);
        Ok(shares)
    }

    /// Share transfer on the owner's behalf, spending the shares' value.
    /// Returns that value.
    pub fn transfer_shares_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        shares: U256,
    ) -> StateResult<U256> {
        let value = self.get_pooled_eth_by_shares(shares)?;
        let remaining = self.allowance_after_spend(&from, &spender, value)?;
        self.transfer_shares(from, to, shares)?;
        self.approve(from, spender, remaining);
        Ok(value)
    }

    fn allowance_after_spend(
        &self,
        owner: &Address,
        spender: &Address,
        amount: U256,
    ) -> StateResult<U256> {
        let current = self.allowance(owner, spender);
        if current == U256::MAX {
            return Ok(current);
        }
        current
            .checked_sub(amount)
            .ok_or(StateError::AllowanceExceeded {
                owner: *owner,
                spender: *spender,
                allowance: current,
                required: amount,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProtocolConfig;
    use tidepool_core::derive_address;

    fn u(n: u64) -> U256 {
        U256::from(n)
    }

    /// 100 bootstrap shares plus 50 for alice, all at 1:1.
    fn pool() -> Pool {
        let mut pool = Pool::new(ProtocolConfig::default()).unwrap();
        pool.initialize(u(100)).unwrap();
        pool.submit(derive_address("alice"), u(50)).unwrap();
        pool
    }

    #[test]
    fn test_unset_allowance_is_zero() {
        let pool = pool();
        let alice = derive_address("alice");
        assert!(pool.allowance(&alice, &derive_address("bob")).is_zero());
    }

    #[test]
    fn test_transfer_from_spends_allowance() {
        let mut pool = pool();
        let alice = derive_address("alice");
        let bob = derive_address("bob");
        let carol = derive_address("carol");
        pool.approve(alice, bob, u(30));

        assert_eq!(pool.transfer_from(bob, alice, carol, u(20)).unwrap(), u(20));
        assert_eq!(pool.allowance(&alice, &bob), u(10));
        assert_eq!(pool.shares_of(&alice), u(30));
        assert_eq!(pool.shares_of(&carol), u(20));

        // Spending the rest clears the entry.
        pool.transfer_from(bob, alice, carol, u(10)).unwrap();
        assert!(pool.allowance(&alice, &bob).is_zero());
        assert!(!pool.allowances.contains_key(&(alice, bob)));
    }

    #[test]
    fn test_transfer_shares_from_spends_value() {
        let mut pool = pool();
        let alice = derive_address("alice");
        let bob = derive_address("bob");
        // 150 shares over 300 ether: one share is worth two
        pool.buffered_ether = u(300);
        pool.approve(alice, bob, u(25));

        assert_eq!(
            pool.transfer_shares_from(bob, alice, bob, u(10)).unwrap(),
            u(20)
        );
        assert_eq!(pool.allowance(&alice, &bob), u(5));
        assert_eq!(pool.shares_of(&bob), u(10));
    }

    #[test]
    fn test_infinite_allowance_is_not_spent() {
        let mut pool = pool();
        let alice = derive_address("alice");
        let bob = derive_address("bob");
        pool.approve(alice, bob, U256::MAX);

        pool.transfer_from(bob, alice, bob, u(20)).unwrap();
        pool.transfer_shares_from(bob, alice, bob, u(5)).unwrap();
        assert_eq!(pool.allowance(&alice, &bob), U256::MAX);
        assert_eq!(pool.shares_of(&bob), u(25));
    }

    #[test]
    fn test_allowance_exceeded_changes_nothing() {
        let mut pool = pool();
        let alice = derive_address("alice");
        let bob = derive_address("bob");
        pool.approve(alice, bob, u(5));
        let before = pool.clone();

        assert_eq!(
            pool.transfer_from(bob, alice, bob, u(6)),
            Err(StateError::AllowanceExceeded {
                owner: alice,
                spender: bob,
                allowance: u(5),
                required: u(6),
            })
        );
        assert!(matches!(
            pool.transfer_shares_from(bob, alice, bob, u(6)),
            Err(StateError::AllowanceExceeded { .. })
        ));
        assert_eq!(pool, before);
    }

    #[test]
    fn test_failed_transfer_keeps_allowance() {
        let mut pool = pool();
        let alice = derive_address("alice");
        let bob = derive_address("bob");
        pool.approve(alice, bob, u(1_000));

        assert!(matches!(
            pool.transfer_from(bob, alice, bob, u(60)),
            Err(StateError::InsufficientShares { .. })
        ));
        assert_eq!(pool.allowance(&alice, &bob), u(1_000));
    }

    #[test]
    fn test_bootstrap_grants_burner_queue_allowance() {
        let pool = pool();
        let addresses = &pool.config().addresses;
        assert_eq!(
            pool.allowance(&addresses.withdrawal_queue, &addresses.burner),
            U256::MAX
        );
    }
}
