use serde::{Deserialize, Serialize};
use tidepool_core::U256;

/// Totals captured before a report touches the pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) struct PreReportTotals {
    pub total_pooled_ether: U256,
    pub total_shares: U256,
    pub cl_validators: u64,
    /// Consensus-layer balance plus 32 ether per newly appeared validator.
    pub cl_balance: U256,
}

/// Result of a settled report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub pre_total_pooled_ether: U256,
    pub pre_total_shares: U256,
    pub post_total_pooled_ether: U256,
    pub post_total_shares: U256,
    /// Pulled from the withdrawal vault.
    pub withdrawals: U256,
    /// Pulled from the execution-layer rewards vault.
    pub el_rewards: U256,
    pub shares_minted_as_fees: U256,
    /// Reserved on the withdrawal queue for finalized requests.
    pub ether_locked: U256,
    pub shares_burnt: U256,
}
