//! Oracle report payload.

use serde::{Deserialize, Serialize};

use crate::u256::U256;

/// An agreed-upon oracle observation for one reporting period.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleReport {
    /// Reference time of the report.
    pub report_timestamp: u64,
    /// Seconds since the previous report.
    pub time_elapsed: u64,
    /// Validators seen on the consensus layer.
    pub cl_validators: u64,
    /// Sum of their consensus-layer balances.
    pub post_cl_balance: U256,
    /// Withdrawal vault balance at the reference slot.
    pub withdrawal_vault_balance: U256,
    /// Execution-layer rewards vault balance at the reference slot.
    pub el_rewards_vault_balance: U256,
    /// Shares the burner has been asked to burn (e.g. cover requests).
    pub shares_requested_to_burn: U256,
    /// Ending request ids of the withdrawal batches to finalize.
    #[serde(default)]
    pub withdrawal_finalization_batches: Vec<u64>,
    /// Share rate (1e27 precision) the oracle simulated off-line.
    pub simulated_share_rate: U256,
}

impl OracleReport {
    /// True when the report finalizes withdrawals.
    pub fn has_withdrawal_batches(&self) -> bool {
        !self.withdrawal_finalization_batches.is_empty()
    }
}
