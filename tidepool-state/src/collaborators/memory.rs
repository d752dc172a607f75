//! In-memory burner, vault, and rebase receiver.

use tidepool_core::{Address, U256};

use super::traits::{Burner, RebaseReceiver, TokenRebase, Vault};

/// Burner that tracks requested and committed totals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordingBurner {
    pub requests: Vec<(Address, U256)>,
    pub total_requested: U256,
    pub total_committed: U256,
}

impl RecordingBurner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested shares not yet committed.
    pub fn pending(&self) -> U256 {
        self.total_requested.saturating_sub(self.total_committed)
    }
}

impl Burner for RecordingBurner {
    fn request_burn_shares(&mut self, from: Address, shares: U256) {
        self.requests.push((from, shares));
        self.total_requested = self.total_requested.saturating_add(shares);
    }

    fn commit_shares_to_burn(&mut self, shares: U256) {
        self.total_committed = self.total_committed.saturating_add(shares);
    }
}

/// Vault holding a plain balance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryVault {
    balance: U256,
    withdrawn: U256,
}

impl MemoryVault {
    pub fn with_balance(balance: U256) -> Self {
        Self {
            balance,
            withdrawn: U256::zero(),
        }
    }

    /// Add ether (rewards arriving, validators exiting).
    pub fn fund(&mut self, amount: U256) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Total ever released to the pool.
    pub fn total_withdrawn(&self) -> U256 {
        self.withdrawn
    }
}

impl Vault for MemoryVault {
    fn balance(&self) -> U256 {
        self.balance
    }

    fn withdraw(&mut self, amount: U256) {
        let amount = amount.min(self.balance);
        self.balance = self.balance - amount;
        self.withdrawn = self.withdrawn.saturating_add(amount);
    }
}

/// Receiver that keeps every rebase it sees.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordingRebaseReceiver {
    pub rebases: Vec<TokenRebase>,
}

impl RebaseReceiver for RecordingRebaseReceiver {
    fn on_post_rebase(&mut self, rebase: &TokenRebase) {
        self.rebases.push(rebase.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidepool_core::derive_address;

    #[test]
    fn test_burner_pending() {
        let mut burner = RecordingBurner::new();
        burner.request_burn_shares(derive_address("withdrawal_queue"), U256::from(10u64));
        burner.commit_shares_to_burn(U256::from(4u64));
        assert_eq!(burner.pending(), U256::from(6u64));
        assert_eq!(burner.requests.len(), 1);
    }

    #[test]
    fn test_vault_withdraw() {
        let mut vault = MemoryVault::with_balance(U256::from(10u64));
        vault.withdraw(U256::from(3u64));
        vault.fund(U256::from(1u64));
        assert_eq!(vault.balance(), U256::from(8u64));
        assert_eq!(vault.total_withdrawn(), U256::from(3u64));
    }
}
