//! Protocol configuration.

use serde::{Deserialize, Serialize};
use tidepool_core::constants::{
    DEFAULT_MAX_POSITIVE_TOKEN_REBASE, DEFAULT_MAX_WITHDRAWAL_AMOUNT,
    DEFAULT_MIN_WITHDRAWAL_AMOUNT, MAX_BATCHES_LENGTH,
};
use tidepool_core::{derive_address, Address, U256};

use crate::error::{StateError, StateResult};

/// Accounts owned by protocol components.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolAddresses {
    /// The pool itself; fee shares are minted here first.
    pub pool: Address,
    /// Receives the treasury part of protocol fees.
    pub treasury: Address,
    /// Holds shares awaiting burn.
    pub burner: Address,
    /// Holds shares locked in withdrawal requests.
    pub withdrawal_queue: Address,
    /// Receives the bootstrap shares.
    pub initial_holder: Address,
}

impl Default for ProtocolAddresses {
    fn default() -> Self {
        Self {
            pool: derive_address("pool"),
            treasury: derive_address("treasury"),
            burner: derive_address("burner"),
            withdrawal_queue: derive_address("withdrawal_queue"),
            initial_holder: derive_address("initial_holder"),
        }
    }
}

impl ProtocolAddresses {
    fn all(&self) -> [(&'static str, Address); 5] {
        [
            ("pool", self.pool),
            ("treasury", self.treasury),
            ("burner", self.burner),
            ("withdrawal_queue", self.withdrawal_queue),
            ("initial_holder", self.initial_holder),
        ]
    }
}

/// Tunable protocol parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Max positive rebase per report in 1e9 precision.
    pub max_positive_token_rebase: u64,
    /// Smallest accepted withdrawal request (wei).
    pub min_withdrawal_amount: U256,
    /// Largest accepted withdrawal request (wei).
    pub max_withdrawal_amount: U256,
    /// Max finalization batches per report.
    pub max_batches_length: usize,
    /// Component accounts.
    pub addresses: ProtocolAddresses,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_positive_token_rebase: DEFAULT_MAX_POSITIVE_TOKEN_REBASE,
            min_withdrawal_amount: U256::from(DEFAULT_MIN_WITHDRAWAL_AMOUNT),
            max_withdrawal_amount: U256::from_u128(DEFAULT_MAX_WITHDRAWAL_AMOUNT),
            max_batches_length: MAX_BATCHES_LENGTH,
            addresses: ProtocolAddresses::default(),
        }
    }
}

impl ProtocolConfig {
    /// Check parameter consistency.
    pub fn validate(&self) -> StateResult<()> {
        if self.max_positive_token_rebase == 0 {
            return Err(invalid("max_positive_token_rebase must be non-zero"));
        }
        if self.min_withdrawal_amount > self.max_withdrawal_amount {
            return Err(invalid(format!(
                "min_withdrawal_amount {} exceeds max_withdrawal_amount {}",
                self.min_withdrawal_amount, self.max_withdrawal_amount
            )));
        }
        if self.max_batches_length == 0 {
            return Err(invalid("max_batches_length must be non-zero"));
        }

        let accounts = self.addresses.all();
        for (i, (name, address)) in accounts.iter().enumerate() {
            if let Some((other, _)) = accounts[i + 1..].iter().find(|(_, a)| a == address) {
                return Err(invalid(format!("{name} and {other} share address {address}")));
            }
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> StateError {
    StateError::InvalidConfig {
        reason: reason.into(),
    }
}
