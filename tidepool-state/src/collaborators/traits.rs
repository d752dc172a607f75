use serde::{Deserialize, Serialize};
use tidepool_core::{Address, ModuleId, StakingRewardsDistribution, U256};

use crate::error::StateResult;

/// Staking module routing.
pub trait StakingRouter {
    /// Fee split for the current module table.
    fn get_staking_rewards_distribution(&self) -> StateResult<StakingRewardsDistribution>;

    /// Notification of fee shares credited per module.
    fn report_rewards_minted(&mut self, module_ids: &[ModuleId], shares: &[U256]);

    /// Deposits module `module_id` can take out of `max_deposits_value`.
    fn max_deposits_count(&self, module_id: ModuleId, max_deposits_value: U256) -> u64;

    /// Hand `deposits_count` deposits worth `deposit_value` to a module.
    fn deposit(
        &mut self,
        deposit_value: U256,
        deposits_count: u64,
        module_id: ModuleId,
    ) -> StateResult<()>;
}

/// Holder of shares awaiting burn.
pub trait Burner {
    /// Shares moved to the burner for later burning.
    fn request_burn_shares(&mut self, from: Address, shares: U256);

    /// Shares burned this report.
    fn commit_shares_to_burn(&mut self, shares: U256);
}

/// An ether vault the pool pulls from.
pub trait Vault {
    /// Current balance.
    fn balance(&self) -> U256;

    /// Release `amount` to the pool. Callers check the balance first.
    fn withdraw(&mut self, amount: U256);
}

/// Figures handed to the accounting check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountingReportCheck {
    pub time_elapsed: u64,
    pub pre_cl_balance: U256,
    pub post_cl_balance: U256,
    pub withdrawal_vault_balance: U256,
    pub el_rewards_vault_balance: U256,
    pub shares_requested_to_burn: U256,
    pub pre_cl_validators: u64,
    pub post_cl_validators: u64,
}

/// Figures handed to the withdrawal queue check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WithdrawalQueueReportCheck {
    pub last_finalizable_request_id: u64,
    /// Creation time of that request.
    pub request_timestamp: u64,
    pub report_timestamp: u64,
}

/// Pluggable report validation policy. Any error aborts the report.
pub trait ReportSanityChecker {
    fn check_accounting_report(&self, check: &AccountingReportCheck) -> StateResult<()>;

    fn check_withdrawal_queue_report(&self, check: &WithdrawalQueueReportCheck) -> StateResult<()>;

    /// Compare the oracle's simulated rate to the rate the settlement
    /// actually produced, with the withdrawal effects added back.
    fn check_simulated_share_rate(
        &self,
        post_total_pooled_ether: U256,
        post_total_shares: U256,
        ether_locked_on_withdrawal_queue: U256,
        shares_burnt_due_to_withdrawals: U256,
        simulated_share_rate: U256,
    ) -> StateResult<()>;
}

/// Before/after totals of one settled report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRebase {
    pub report_timestamp: u64,
    pub time_elapsed: u64,
    pub pre_total_shares: U256,
    pub pre_total_ether: U256,
    pub post_total_shares: U256,
    pub post_total_ether: U256,
    pub shares_minted_as_fees: U256,
}

/// Observer of completed rebases.
pub trait RebaseReceiver {
    fn on_post_rebase(&mut self, rebase: &TokenRebase);
}

/// Collaborators for one settlement call.
pub struct Collaborators<'a> {
    pub router: &'a mut dyn StakingRouter,
    pub burner: &'a mut dyn Burner,
    pub withdrawal_vault: &'a mut dyn Vault,
    pub el_rewards_vault: &'a mut dyn Vault,
    pub sanity_checker: &'a dyn ReportSanityChecker,
    pub rebase_receiver: Option<&'a mut dyn RebaseReceiver>,
}
