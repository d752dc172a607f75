//! Scenario execution.

use std::collections::BTreeMap;

use anyhow::{anyhow, Context};
use serde::Serialize;
use tidepool_core::constants::share_rate_precision;
use tidepool_core::{Address, BatchesCalculationState, OracleReport, U256};
use tidepool_state::{
    AcceptAllSanityChecker, Collaborators, DeviationSanityChecker, FixedModuleRouter, MemoryVault,
    Pool, RecordingBurner, RecordingRebaseReceiver, ReportOutcome, ReportSanityChecker,
    StateResult, Vault,
};
use tracing::{info, warn};

use crate::scenario::{resolve_account, Action, SanityPolicy, Scenario, VaultName};

/// Requests scanned per batch calculation call.
const MAX_REQUESTS_PER_CALL: u64 = 1_000;

/// The pool with its collaborators, assembled once per scenario.
pub struct Simulation {
    pool: Pool,
    router: FixedModuleRouter,
    burner: RecordingBurner,
    withdrawal_vault: MemoryVault,
    el_rewards_vault: MemoryVault,
    receiver: RecordingRebaseReceiver,
    checker: Box<dyn ReportSanityChecker>,
    request_timestamp_margin: u64,
    names: BTreeMap<Address, String>,
    reports: Vec<ReportOutcome>,
    failures: Vec<String>,
}

/// Final state printed by the runner.
#[derive(Clone, Debug, Serialize)]
pub struct Summary {
    pub total_pooled_ether: U256,
    pub total_shares: U256,
    pub share_rate: U256,
    pub buffered_ether: U256,
    pub cl_balance: U256,
    pub cl_validators: u64,
    pub deposited_validators: u64,
    pub total_el_rewards_collected: U256,
    pub last_request_id: u64,
    pub last_finalized_request_id: u64,
    pub locked_ether: U256,
    pub holders: Vec<Holder>,
    pub reports: Vec<ReportOutcome>,
    pub failures: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Holder {
    pub account: String,
    pub shares: U256,
    pub balance: U256,
}

impl Simulation {
    pub fn new(scenario: &Scenario) -> anyhow::Result<Self> {
        let pool = Pool::new(scenario.config.clone())?;
        let modules = scenario
            .modules
            .iter()
            .map(|m| m.to_entry())
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut names = BTreeMap::new();
        let addresses = &scenario.config.addresses;
        for (address, name) in [
            (addresses.pool, "pool"),
            (addresses.treasury, "treasury"),
            (addresses.burner, "burner"),
            (addresses.withdrawal_queue, "withdrawal_queue"),
            (addresses.initial_holder, "initial_holder"),
        ] {
            names.insert(address, name.to_string());
        }
        for (spec, entry) in scenario.modules.iter().zip(&modules) {
            names.insert(entry.recipient, spec.recipient.clone());
        }

        let deviation = DeviationSanityChecker::default();
        let (checker, request_timestamp_margin): (Box<dyn ReportSanityChecker>, u64) =
            match scenario.sanity {
                SanityPolicy::AcceptAll => (Box::new(AcceptAllSanityChecker), 0),
                SanityPolicy::Deviation => (Box::new(deviation), deviation.request_timestamp_margin),
            };

        Ok(Self {
            pool,
            router: FixedModuleRouter::new(modules),
            burner: RecordingBurner::new(),
            withdrawal_vault: MemoryVault::default(),
            el_rewards_vault: MemoryVault::default(),
            receiver: RecordingRebaseReceiver::default(),
            checker,
            request_timestamp_margin,
            names,
            reports: Vec::new(),
            failures: Vec::new(),
        })
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Run every action in order. With `keep_going`, failed actions are
    /// logged and recorded instead of stopping the run.
    pub fn run(&mut self, actions: &[Action], keep_going: bool) -> anyhow::Result<()> {
        for (index, action) in actions.iter().enumerate() {
            if let Err(e) = self.apply(action) {
                let message = format!("action {index} ({}) failed: {e:#}", action.name());
                if !keep_going {
                    return Err(anyhow!(message));
                }
                warn!("{message}");
                self.failures.push(message);
            }
        }
        Ok(())
    }

    fn account(&mut self, label: &str) -> anyhow::Result<Address> {
        let address = resolve_account(label)?;
        self.names.entry(address).or_insert_with(|| label.to_string());
        Ok(address)
    }

    fn apply(&mut self, action: &Action) -> anyhow::Result<()> {
        match action {
            Action::Bootstrap { amount } => {
                self.pool.initialize(*amount)?;
            }
            Action::Submit { account, amount } => {
                let sender = self.account(account)?;
                let shares = self.pool.submit(sender, *amount)?;
                info!(account = %account, %amount, %shares, "submitted");
            }
            Action::Deposit {
                module_id,
                max_deposits,
            } => {
                let count = self.pool.deposit(*max_deposits, *module_id, &mut self.router)?;
                info!(module_id, count, "deposited");
            }
            Action::RequestWithdrawal {
                account,
                amount,
                timestamp,
            } => {
                let owner = self.account(account)?;
                let request_id = self.pool.request_withdrawal(owner, *amount, *timestamp)?;
                info!(account = %account, %amount, request_id, "withdrawal requested");
            }
            Action::FundVault { vault, amount } => match vault {
                VaultName::Withdrawal => self.withdrawal_vault.fund(*amount),
                VaultName::ElRewards => self.el_rewards_vault.fund(*amount),
            },
            Action::Report {
                timestamp,
                time_elapsed,
                cl_validators,
                post_cl_balance,
                shares_requested_to_burn,
                finalize,
                simulated_share_rate,
            } => {
                let share_rate = match simulated_share_rate {
                    Some(rate) => *rate,
                    None => self.current_share_rate()?,
                };
                let withdrawal_finalization_batches = if *finalize {
                    self.finalization_batches(*timestamp, share_rate)?
                } else {
                    Vec::new()
                };
                let report = OracleReport {
                    report_timestamp: *timestamp,
                    time_elapsed: *time_elapsed,
                    cl_validators: *cl_validators,
                    post_cl_balance: *post_cl_balance,
                    withdrawal_vault_balance: self.withdrawal_vault.balance(),
                    el_rewards_vault_balance: self.el_rewards_vault.balance(),
                    shares_requested_to_burn: *shares_requested_to_burn,
                    withdrawal_finalization_batches,
                    simulated_share_rate: share_rate,
                };
                let outcome = self.report(&report)?;
                self.reports.push(outcome);
            }
            Action::Claim {
                account,
                request_id,
            } => {
                let recipient = self.account(account)?;
                let queue = self.pool.queue();
                let hint = queue
                    .find_checkpoint_hint(*request_id, 1, queue.last_checkpoint_index())?
                    .with_context(|| format!("request {request_id} is not finalized"))?;
                let claimed = self.pool.claim_withdrawal(*request_id, hint, recipient)?;
                info!(request_id, amount = %claimed.amount_of_eth, "withdrawal claimed");
            }
            Action::Approve {
                owner,
                spender,
                amount,
            } => {
                let owner = self.account(owner)?;
                let spender = self.account(spender)?;
                self.pool.approve(owner, spender, *amount);
            }
            Action::TransferFrom {
                spender,
                from,
                to,
                amount,
            } => {
                let spender = self.account(spender)?;
                let from = self.account(from)?;
                let to = self.account(to)?;
                let shares = self.pool.transfer_from(spender, from, to, *amount)?;
                info!(%amount, %shares, "transferred on behalf");
            }
            Action::SetBunkerMode { active } => self.pool.set_bunker_mode(*active),
            Action::SetModuleStatus { module_id, status } => {
                if !self.router.set_status(*module_id, *status) {
                    return Err(anyhow!("unknown module {module_id}"));
                }
            }
        }
        Ok(())
    }

    fn report(&mut self, report: &OracleReport) -> StateResult<ReportOutcome> {
        let mut collaborators = Collaborators {
            router: &mut self.router,
            burner: &mut self.burner,
            withdrawal_vault: &mut self.withdrawal_vault,
            el_rewards_vault: &mut self.el_rewards_vault,
            sanity_checker: self.checker.as_ref(),
            rebase_receiver: Some(&mut self.receiver),
        };
        self.pool.handle_oracle_report(report, &mut collaborators)
    }

    fn current_share_rate(&self) -> anyhow::Result<U256> {
        let total_shares = self.pool.total_shares();
        if total_shares.is_zero() {
            return Ok(share_rate_precision());
        }
        self.pool
            .total_pooled_ether()
            .mul_div(share_rate_precision(), total_shares)
            .context("share rate overflow")
    }

    /// Batches covering every request old enough for `report_timestamp`
    /// that the buffer plus the withdrawal vault can pay for.
    fn finalization_batches(&self, report_timestamp: u64, share_rate: U256) -> anyhow::Result<Vec<u64>> {
        let queue = self.pool.queue();
        if queue.unfinalized_request_number() == 0 {
            return Ok(Vec::new());
        }
        let budget = self
            .pool
            .buffered_ether()
            .saturating_add(self.withdrawal_vault.balance());
        if budget.is_zero() {
            return Ok(Vec::new());
        }

        let max_timestamp = report_timestamp.saturating_sub(self.request_timestamp_margin);
        let mut state = BatchesCalculationState::new(budget);
        loop {
            state = queue.calculate_finalization_batches(
                share_rate,
                max_timestamp,
                MAX_REQUESTS_PER_CALL,
                state,
            )?;
            if state.finished || state.remaining_eth_budget.is_zero() {
                return Ok(state.batches);
            }
        }
    }

    pub fn summary(&self) -> anyhow::Result<Summary> {
        let (deposited_validators, cl_validators, cl_balance) = self.pool.beacon_stat();
        let holders = self
            .pool
            .shares_book()
            .holders()
            .map(|(address, shares)| {
                Ok(Holder {
                    account: self
                        .names
                        .get(address)
                        .cloned()
                        .unwrap_or_else(|| address.to_string()),
                    shares: *shares,
                    balance: self.pool.get_pooled_eth_by_shares(*shares)?,
                })
            })
            .collect::<StateResult<Vec<_>>>()?;

        Ok(Summary {
            total_pooled_ether: self.pool.total_pooled_ether(),
            total_shares: self.pool.total_shares(),
            share_rate: self.current_share_rate()?,
            buffered_ether: self.pool.buffered_ether(),
            cl_balance,
            cl_validators,
            deposited_validators,
            total_el_rewards_collected: self.pool.total_el_rewards_collected(),
            last_request_id: self.pool.queue().last_request_id(),
            last_finalized_request_id: self.pool.queue().last_finalized_request_id(),
            locked_ether: self.pool.queue().locked_ether_amount(),
            holders,
            reports: self.reports.clone(),
            failures: self.failures.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::load;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tidepool_core::derive_address;

    const ETHER: &str = "000000000000000000";

    fn scenario(actions: &str) -> Scenario {
        let json = format!(
            r#"{{
                "modules": [{{"id": 1, "recipient": "curated", "module_fee": 500,
                              "treasury_fee": 500, "target_share": 10000,
                              "available_validators": 10}}],
                "actions": {actions}
            }}"#
        );
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        load(file.path()).unwrap()
    }

    #[test]
    fn test_full_cycle() {
        let actions = format!(
            r#"[
                {{"action": "bootstrap", "amount": "32{ETHER}"}},
                {{"action": "submit", "account": "alice", "amount": "64{ETHER}"}},
                {{"action": "deposit", "module_id": 1, "max_deposits": 2}},
                {{"action": "report", "timestamp": 86400, "time_elapsed": 86400,
                  "cl_validators": 2, "post_cl_balance": "64{ETHER}"}},
                {{"action": "request_withdrawal", "account": "alice",
                  "amount": "10{ETHER}", "timestamp": 90000}},
                {{"action": "report", "timestamp": 172800, "time_elapsed": 86400,
                  "cl_validators": 2, "post_cl_balance": "64{ETHER}", "finalize": true}},
                {{"action": "claim", "account": "alice", "request_id": 1}}
            ]"#
        );
        let scenario = scenario(&actions);
        let mut sim = Simulation::new(&scenario).unwrap();
        sim.run(&scenario.actions, false).unwrap();

        let summary = sim.summary().unwrap();
        assert_eq!(summary.reports.len(), 2);
        assert_eq!(summary.deposited_validators, 2);
        assert_eq!(summary.cl_validators, 2);
        assert_eq!(summary.last_finalized_request_id, 1);
        assert!(summary.locked_ether.is_zero());
        assert_eq!(summary.total_pooled_ether, U256::ether(86));
        assert_eq!(summary.buffered_ether, U256::ether(22));
        assert!(summary.holders.iter().any(|h| h.account == "alice"));
        assert!(summary.failures.is_empty());
    }

    #[test]
    fn test_transfer_from_uses_allowance() {
        let actions = format!(
            r#"[
                {{"action": "bootstrap", "amount": "32{ETHER}"}},
                {{"action": "submit", "account": "alice", "amount": "8{ETHER}"}},
                {{"action": "approve", "owner": "alice", "spender": "bob", "amount": "5{ETHER}"}},
                {{"action": "transfer_from", "spender": "bob", "from": "alice",
                  "to": "carol", "amount": "3{ETHER}"}},
                {{"action": "transfer_from", "spender": "bob", "from": "alice",
                  "to": "carol", "amount": "3{ETHER}"}}
            ]"#
        );
        let scenario = scenario(&actions);
        let mut sim = Simulation::new(&scenario).unwrap();
        sim.run(&scenario.actions, true).unwrap();

        let alice = derive_address("alice");
        let bob = derive_address("bob");
        let carol = derive_address("carol");
        assert_eq!(sim.pool().shares_of(&carol), U256::ether(3));
        assert_eq!(sim.pool().shares_of(&alice), U256::ether(5));
        assert_eq!(sim.pool().allowance(&alice, &bob), U256::ether(2));

        let summary = sim.summary().unwrap();
        assert_eq!(summary.failures.len(), 1);
        assert!(summary.failures[0].contains("action 4 (transfer_from)"));
    }

    #[test]
    fn test_failure_stops_run() {
        let actions = format!(
            r#"[
                {{"action": "submit", "account": "alice", "amount": "1{ETHER}"}},
                {{"action": "bootstrap", "amount": "1{ETHER}"}}
            ]"#
        );
        let scenario = scenario(&actions);
        let mut sim = Simulation::new(&scenario).unwrap();
        let err = sim.run(&scenario.actions, false).unwrap_err();
        assert!(err.to_string().contains("action 0 (submit)"));
        assert!(sim.pool().total_shares().is_zero());
    }

    #[test]
    fn test_keep_going_records_failures() {
        let actions = format!(
            r#"[
                {{"action": "bootstrap", "amount": "32{ETHER}"}},
                {{"action": "report", "timestamp": 1, "time_elapsed": 1,
                  "cl_validators": 1, "post_cl_balance": "32{ETHER}"}},
                {{"action": "set_module_status", "module_id": 9, "status": "Stopped"}},
                {{"action": "submit", "account": "bob", "amount": "1{ETHER}"}}
            ]"#
        );
        let scenario = scenario(&actions);
        let mut sim = Simulation::new(&scenario).unwrap();
        sim.run(&scenario.actions, true).unwrap();

        let summary = sim.summary().unwrap();
        assert_eq!(summary.failures.len(), 2);
        assert!(summary.reports.is_empty());
        assert_eq!(summary.total_pooled_ether, U256::ether(33));
    }
}
