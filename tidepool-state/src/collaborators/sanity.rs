//! Reference report-sanity policies.

use tidepool_core::constants::{share_rate_precision, TOTAL_BASIS_POINTS};
use tidepool_core::U256;

use super::traits::{AccountingReportCheck, ReportSanityChecker, WithdrawalQueueReportCheck};
use crate::error::{StateError, StateResult};

/// Accepts every report.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAllSanityChecker;

impl ReportSanityChecker for AcceptAllSanityChecker {
    fn check_accounting_report(&self, _check: &AccountingReportCheck) -> StateResult<()> {
        Ok(())
    }

    fn check_withdrawal_queue_report(&self, _check: &WithdrawalQueueReportCheck) -> StateResult<()> {
        Ok(())
    }

    fn check_simulated_share_rate(
        &self,
        _post_total_pooled_ether: U256,
        _post_total_shares: U256,
        _ether_locked_on_withdrawal_queue: U256,
        _shares_burnt_due_to_withdrawals: U256,
        _simulated_share_rate: U256,
    ) -> StateResult<()> {
        Ok(())
    }
}

/// Default bound on simulated vs actual share rate (0.5%).
pub const DEFAULT_SIMULATED_SHARE_RATE_DEVIATION_BP: u64 = 50;

/// Default minimum age of a finalizable request at report time (seconds).
pub const DEFAULT_REQUEST_TIMESTAMP_MARGIN: u64 = 7_680;

/// Enforces the simulated share rate bound and the request age margin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviationSanityChecker {
    pub simulated_share_rate_deviation_bp_limit: u64,
    pub request_timestamp_margin: u64,
}

impl Default for DeviationSanityChecker {
    fn default() -> Self {
        Self {
            simulated_share_rate_deviation_bp_limit: DEFAULT_SIMULATED_SHARE_RATE_DEVIATION_BP,
            request_timestamp_margin: DEFAULT_REQUEST_TIMESTAMP_MARGIN,
        }
    }
}

impl ReportSanityChecker for DeviationSanityChecker {
    fn check_accounting_report(&self, _check: &AccountingReportCheck) -> StateResult<()> {
        Ok(())
    }

    fn check_withdrawal_queue_report(&self, check: &WithdrawalQueueReportCheck) -> StateResult<()> {
        if check.request_timestamp.saturating_add(self.request_timestamp_margin) > check.report_timestamp {
            return Err(StateError::SanityCheckFailed {
                check: "withdrawal_queue_report",
                reason: format!(
                    "request {} created at {} is too recent for report at {}",
                    check.last_finalizable_request_id, check.request_timestamp, check.report_timestamp
                ),
            });
        }
        Ok(())
    }

    fn check_simulated_share_rate(
        &self,
        post_total_pooled_ether: U256,
        post_total_shares: U256,
        ether_locked_on_withdrawal_queue: U256,
        shares_burnt_due_to_withdrawals: U256,
        simulated_share_rate: U256,
    ) -> StateResult<()> {
        // Undo the withdrawal effects so both rates describe the same pool.
        let ether = post_total_pooled_ether.saturating_add(ether_locked_on_withdrawal_queue);
        let shares = post_total_shares.saturating_add(shares_burnt_due_to_withdrawals);
        let actual_share_rate = ether
            .mul_div(share_rate_precision(), shares)
            .ok_or(StateError::DivisionByZero {
                context: "actual share rate",
            })?;
        if actual_share_rate.is_zero() {
            return Err(StateError::SanityCheckFailed {
                check: "simulated_share_rate",
                reason: "actual share rate is zero".to_string(),
            });
        }

        let diff = if actual_share_rate > simulated_share_rate {
            actual_share_rate - simulated_share_rate
        } else {
            simulated_share_rate - actual_share_rate
        };
        let deviation_bp = diff
            .mul_div(U256::from(TOTAL_BASIS_POINTS), actual_share_rate)
            .ok_or(StateError::ArithmeticOverflow {
                context: "share rate deviation",
            })?;
        if deviation_bp > U256::from(self.simulated_share_rate_deviation_bp_limit) {
            return Err(StateError::SanityCheckFailed {
                check: "simulated_share_rate",
                reason: format!(
                    "simulated {} deviates {} bp from actual {}",
                    simulated_share_rate, deviation_bp, actual_share_rate
                ),
            });
        }
        Ok(())
    }
}
