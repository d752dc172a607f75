//! The nine-step oracle report.

use tidepool_core::constants::deposit_size;
use tidepool_core::{OracleReport, U256};
use tracing::{debug, info, warn};

use super::context::{PreReportTotals, ReportOutcome};
use super::effects::{Effect, EffectLog, VaultKind};
use crate::collaborators::{
    AccountingReportCheck, Collaborators, TokenRebase, WithdrawalQueueReportCheck,
};
use crate::error::{StateError, StateResult};
use crate::limiter::{smoothen_token_rebase, SmoothingInput};
use crate::pool::Pool;

impl Pool {
    /// Settle one oracle report.
    ///
    /// All steps run on a scratch copy. The pool is replaced and the
    /// collaborator effects are dispatched only when every step passed;
    /// on error neither the pool nor any collaborator has changed.
    pub fn handle_oracle_report(
        &mut self,
        report: &OracleReport,
        collaborators: &mut Collaborators<'_>,
    ) -> StateResult<ReportOutcome> {
        let mut scratch = self.clone();
        let mut effects = EffectLog::new();

        let outcome = match scratch.apply_oracle_report(report, collaborators, &mut effects) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(report_timestamp = report.report_timestamp, error = %e, "oracle report aborted");
                return Err(e);
            }
        };

        *self = scratch;
        effects.dispatch(collaborators);

        info!(
            report_timestamp = report.report_timestamp,
            pre_total_pooled_ether = %outcome.pre_total_pooled_ether,
            post_total_pooled_ether = %outcome.post_total_pooled_ether,
            pre_total_shares = %outcome.pre_total_shares,
            post_total_shares = %outcome.post_total_shares,
            shares_minted_as_fees = %outcome.shares_minted_as_fees,
            "oracle report settled"
        );
        Ok(outcome)
    }

    fn apply_oracle_report(
        &mut self,
        report: &OracleReport,
        collaborators: &Collaborators<'_>,
        effects: &mut EffectLog,
    ) -> StateResult<ReportOutcome> {
        // Step 1: pre-report totals and consensus-layer state.
        let mut pre = PreReportTotals {
            total_pooled_ether: self.total_pooled_ether(),
            total_shares: self.total_shares(),
            cl_validators: self.cl_validators,
            cl_balance: U256::zero(),
        };
        pre.cl_balance = self.process_cl_state_update(report)?;
        debug!(step = 1, pre_cl_balance = %pre.cl_balance, cl_validators = self.cl_validators, "consensus layer state updated");

        // Step 2: external accounting policy and vault coverage.
        collaborators
            .sanity_checker
            .check_accounting_report(&AccountingReportCheck {
                time_elapsed: report.time_elapsed,
                pre_cl_balance: pre.cl_balance,
                post_cl_balance: report.post_cl_balance,
                withdrawal_vault_balance: report.withdrawal_vault_balance,
                el_rewards_vault_balance: report.el_rewards_vault_balance,
                shares_requested_to_burn: report.shares_requested_to_burn,
                pre_cl_validators: pre.cl_validators,
                post_cl_validators: report.cl_validators,
            })?;
        check_vault_balance(
            "withdrawal",
            collaborators.withdrawal_vault.balance(),
            report.withdrawal_vault_balance,
        )?;
        check_vault_balance(
            "el_rewards",
            collaborators.el_rewards_vault.balance(),
            report.el_rewards_vault_balance,
        )?;
        debug!(step = 2, "accounting report accepted");

        // Step 3: price the finalization batches and hand the shares to the burner.
        let (ether_to_lock, shares_from_queue) = match report.withdrawal_finalization_batches.last()
        {
            Some(&last_request_id) => {
                self.prepare_withdrawals(report, last_request_id, collaborators, effects)?
            }
            None => (U256::zero(), U256::zero()),
        };
        debug!(step = 3, %ether_to_lock, %shares_from_queue, "withdrawals priced");

        // Step 4: clamp inflows and burns to the rebase limit.
        let rebase = smoothen_token_rebase(
            self.config.max_positive_token_rebase,
            &SmoothingInput {
                pre_total_pooled_ether: pre.total_pooled_ether,
                pre_total_shares: pre.total_shares,
                pre_cl_balance: pre.cl_balance,
                post_cl_balance: report.post_cl_balance,
                withdrawal_vault_balance: report.withdrawal_vault_balance,
                el_rewards_vault_balance: report.el_rewards_vault_balance,
                shares_requested_to_burn: report.shares_requested_to_burn,
                ether_to_lock_for_withdrawals: ether_to_lock,
                new_shares_to_burn_for_withdrawals: shares_from_queue,
            },
        )?;
        debug!(
            step = 4,
            withdrawals = %rebase.withdrawals,
            el_rewards = %rebase.el_rewards,
            shares_to_burn = %rebase.shares_to_burn,
            "token rebase smoothened"
        );

        // Step 5: collect vault ether, finalize requests, update the buffer.
        self.collect_rewards_and_process_withdrawals(
            report,
            rebase.withdrawals,
            rebase.el_rewards,
            ether_to_lock,
            effects,
        )?;
        debug!(step = 5, buffered_ether = %self.buffered_ether, "rewards collected");

        // Step 6: burn.
        if !rebase.shares_to_burn.is_zero() {
            let burner = self.config.addresses.burner;
            self.burn_shares(burner, rebase.shares_to_burn)?;
            effects.record(Effect::CommitSharesToBurn {
                shares: rebase.shares_to_burn,
            });
        }
        debug!(step = 6, shares_burnt = %rebase.shares_to_burn, "shares burnt");

        // Step 7: protocol fee on the consensus-layer gain plus collected rewards.
        let post_cl_total_balance = report
            .post_cl_balance
            .checked_add(rebase.withdrawals)
            .ok_or(StateError::ArithmeticOverflow {
                context: "post consensus layer balance",
            })?;
        let shares_minted_as_fees = if post_cl_total_balance > pre.cl_balance {
            let total_rewards = (post_cl_total_balance - pre.cl_balance)
                .checked_add(rebase.el_rewards)
                .ok_or(StateError::ArithmeticOverflow {
                    context: "total rewards",
                })?;
            let distribution = collaborators.router.get_staking_rewards_distribution()?;
            self.distribute_fee(
                &distribution,
                pre.total_pooled_ether,
                pre.total_shares,
                total_rewards,
                effects,
            )?
        } else {
            U256::zero()
        };
        debug!(step = 7, %shares_minted_as_fees, "rewards processed");

        // Step 8: post totals and rebase notification.
        let post_total_pooled_ether = self.total_pooled_ether();
        let post_total_shares = self.total_shares();
        effects.record(Effect::PostRebase(TokenRebase {
            report_timestamp: report.report_timestamp,
            time_elapsed: report.time_elapsed,
            pre_total_shares: pre.total_shares,
            pre_total_ether: pre.total_pooled_ether,
            post_total_shares,
            post_total_ether: post_total_pooled_ether,
            shares_minted_as_fees,
        }));
        debug!(step = 8, %post_total_pooled_ether, %post_total_shares, "post totals computed");

        // Step 9: the oracle's simulated rate against the settled one.
        if report.has_withdrawal_batches() {
            collaborators.sanity_checker.check_simulated_share_rate(
                post_total_pooled_ether,
                post_total_shares,
                ether_to_lock,
                rebase
                    .shares_to_burn
                    .saturating_sub(rebase.simulated_shares_to_burn),
                report.simulated_share_rate,
            )?;
            debug!(step = 9, "simulated share rate accepted");
        }

        Ok(ReportOutcome {
            pre_total_pooled_ether: pre.total_pooled_ether,
            pre_total_shares: pre.total_shares,
            post_total_pooled_ether,
            post_total_shares,
            withdrawals: rebase.withdrawals,
            el_rewards: rebase.el_rewards,
            shares_minted_as_fees,
            ether_locked: ether_to_lock,
            shares_burnt: rebase.shares_to_burn,
        })
    }

    /// Track the reported validators and balance. Returns the pre-report
    /// balance with 32 ether added per newly appeared validator.
    fn process_cl_state_update(&mut self, report: &OracleReport) -> StateResult<U256> {
        if report.cl_validators > self.deposited_validators {
            return Err(StateError::ReportedMoreDepositedThanExists {
                reported: report.cl_validators,
                deposited: self.deposited_validators,
            });
        }
        if report.cl_validators < self.cl_validators {
            return Err(StateError::ReportedValidatorCountDecreased {
                reported: report.cl_validators,
                previous: self.cl_validators,
            });
        }

        let appeared = report.cl_validators - self.cl_validators;
        let pre_cl_balance = self
            .cl_balance
            .checked_add(deposit_size() * U256::from(appeared))
            .ok_or(StateError::ArithmeticOverflow {
                context: "pre consensus layer balance",
            })?;

        self.last_report_timestamp = report.report_timestamp;
        self.cl_validators = report.cl_validators;
        self.cl_balance = report.post_cl_balance;
        self.queue.on_oracle_report(report.report_timestamp);
        Ok(pre_cl_balance)
    }

    fn prepare_withdrawals(
        &mut self,
        report: &OracleReport,
        last_request_id: u64,
        collaborators: &Collaborators<'_>,
        effects: &mut EffectLog,
    ) -> StateResult<(U256, U256)> {
        let status = self.queue.get_status(last_request_id)?;
        collaborators
            .sanity_checker
            .check_withdrawal_queue_report(&WithdrawalQueueReportCheck {
                last_finalizable_request_id: last_request_id,
                request_timestamp: status.timestamp,
                report_timestamp: report.report_timestamp,
            })?;

        let (ether_to_lock, shares_to_burn) = self
            .queue
            .prefinalize(&report.withdrawal_finalization_batches, report.simulated_share_rate)?;

        if !shares_to_burn.is_zero() {
            let from = self.config.addresses.withdrawal_queue;
            self.transfer_shares(from, self.config.addresses.burner, shares_to_burn)?;
            effects.record(Effect::RequestBurnShares {
                from,
                shares: shares_to_burn,
            });
        }
        Ok((ether_to_lock, shares_to_burn))
    }

    fn collect_rewards_and_process_withdrawals(
        &mut self,
        report: &OracleReport,
        withdrawals: U256,
        el_rewards: U256,
        ether_to_lock: U256,
        effects: &mut EffectLog,
    ) -> StateResult<()> {
        if !el_rewards.is_zero() {
            effects.record(Effect::WithdrawFromVault {
                vault: VaultKind::ElRewards,
                amount: el_rewards,
            });
        }
        if !withdrawals.is_zero() {
            effects.record(Effect::WithdrawFromVault {
                vault: VaultKind::Withdrawal,
                amount: withdrawals,
            });
        }
        self.total_el_rewards_collected = self
            .total_el_rewards_collected
            .checked_add(el_rewards)
            .ok_or(StateError::ArithmeticOverflow {
                context: "total el rewards",
            })?;

        if !ether_to_lock.is_zero() {
            if let Some(&last_request_id) = report.withdrawal_finalization_batches.last() {
                self.queue
                    .finalize(last_request_id, ether_to_lock, report.simulated_share_rate)?;
            }
        }

        let available = self
            .buffered_ether
            .checked_add(el_rewards)
            .and_then(|v| v.checked_add(withdrawals))
            .ok_or(StateError::ArithmeticOverflow {
                context: "buffered ether",
            })?;
        self.buffered_ether =
            available
                .checked_sub(ether_to_lock)
                .ok_or(StateError::InsufficientBufferedEther {
                    available,
                    required: ether_to_lock,
                })?;
        Ok(())
    }
}

fn check_vault_balance(vault: &'static str, balance: U256, reported: U256) -> StateResult<()> {
    if balance < reported {
        return Err(StateError::VaultBalanceTooLow {
            vault,
            balance,
            reported,
        });
    }
    Ok(())
}
