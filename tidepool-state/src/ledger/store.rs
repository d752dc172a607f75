//! Share storage traits.

use tidepool_core::{Address, U256};

/// Read access to share balances.
pub trait SharesReader {
    /// Shares held by an account. Missing accounts hold zero.
    fn shares_of(&self, account: &Address) -> U256;

    /// Total share supply.
    fn total_shares(&self) -> U256;
}

/// Mutable access to share balances.
///
/// Writers keep no invariants of their own; the ledger functions keep
/// `sum(shares_of) == total_shares`.
pub trait SharesWriter: SharesReader {
    /// Overwrite an account's balance.
    fn set_shares(&mut self, account: &Address, shares: U256);

    /// Overwrite the total supply.
    fn set_total_shares(&mut self, total: U256);
}
