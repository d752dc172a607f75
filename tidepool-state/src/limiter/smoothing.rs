//! Token rebase smoothing.
//!
//! Drives the limiter through one report's value changes in a fixed
//! order: consensus-layer delta, withdrawal vault, rewards vault, then
//! the ether locked for withdrawals.

use tidepool_core::U256;

use super::positive_rebase::TokenRebaseLimiter;
use crate::error::StateResult;

/// Inputs of [`smoothen_token_rebase`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SmoothingInput {
    pub pre_total_pooled_ether: U256,
    pub pre_total_shares: U256,
    pub pre_cl_balance: U256,
    pub post_cl_balance: U256,
    pub withdrawal_vault_balance: U256,
    pub el_rewards_vault_balance: U256,
    pub shares_requested_to_burn: U256,
    pub ether_to_lock_for_withdrawals: U256,
    pub new_shares_to_burn_for_withdrawals: U256,
}

/// Amounts the report may actually apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SmoothenedRebase {
    /// Ether to pull from the withdrawal vault.
    pub withdrawals: U256,
    /// Ether to pull from the rewards vault.
    pub el_rewards: U256,
    /// Requested burns that fit before locking withdrawal ether.
    pub simulated_shares_to_burn: U256,
    /// Total shares to burn this report.
    pub shares_to_burn: U256,
}

/// Clamp one report's inflows and burns to the rebase limit.
pub fn smoothen_token_rebase(
    rebase_limit: u64,
    input: &SmoothingInput,
) -> StateResult<SmoothenedRebase> {
    let mut limiter = TokenRebaseLimiter::init(
        rebase_limit,
        input.pre_total_pooled_ether,
        input.pre_total_shares,
    )?;

    if input.post_cl_balance < input.pre_cl_balance {
        limiter.decrease_ether(input.pre_cl_balance - input.post_cl_balance)?;
    } else {
        limiter.increase_ether(input.post_cl_balance - input.pre_cl_balance);
    }

    let withdrawals = limiter.increase_ether(input.withdrawal_vault_balance);
    let el_rewards = limiter.increase_ether(input.el_rewards_vault_balance);

    let simulated_shares_to_burn = limiter
        .shares_to_burn_limit()?
        .min(input.shares_requested_to_burn);

    limiter.decrease_ether(input.ether_to_lock_for_withdrawals)?;

    let requested = input
        .new_shares_to_burn_for_withdrawals
        .saturating_add(input.shares_requested_to_burn);
    let shares_to_burn = limiter.shares_to_burn_limit()?.min(requested);

    Ok(SmoothenedRebase {
        withdrawals,
        el_rewards,
        simulated_shares_to_burn,
        shares_to_burn,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidepool_core::constants::UNLIMITED_REBASE;

    fn u(n: u64) -> U256 {
        U256::from(n)
    }

    fn base_input() -> SmoothingInput {
        SmoothingInput {
            pre_total_pooled_ether: u(1_000),
            pre_total_shares: u(1_000),
            pre_cl_balance: u(800),
            post_cl_balance: u(800),
            ..SmoothingInput::default()
        }
    }

    #[test]
    fn test_no_change() {
        let out = smoothen_token_rebase(100_000_000, &base_input()).unwrap();
        assert_eq!(out, SmoothenedRebase::default());
    }

    #[test]
    fn test_cl_gain_consumes_headroom_first() {
        // 10% headroom = 100; CL gain takes 70, withdrawals 30, rewards 0
        let input = SmoothingInput {
            post_cl_balance: u(870),
            withdrawal_vault_balance: u(50),
            el_rewards_vault_balance: u(20),
            ..base_input()
        };
        let out = smoothen_token_rebase(100_000_000, &input).unwrap();
        assert_eq!(out.withdrawals, u(30));
        assert_eq!(out.el_rewards, u(0));
    }

    #[test]
    fn test_cl_loss_frees_headroom() {
        // -50 on CL, so 150 fits before the ceiling
        let input = SmoothingInput {
            post_cl_balance: u(750),
            withdrawal_vault_balance: u(120),
            el_rewards_vault_balance: u(40),
            ..base_input()
        };
        let out = smoothen_token_rebase(100_000_000, &input).unwrap();
        assert_eq!(out.withdrawals, u(120));
        assert_eq!(out.el_rewards, u(30));
    }

    #[test]
    fn test_withdrawal_burn_capped() {
        // lock 100 ether for 100 shares; current = 900 after lock
        // limit = 1000 * (1.1e9 - 0.9e9) / 1.1e9 = 181
        let input = SmoothingInput {
            ether_to_lock_for_withdrawals: u(100),
            new_shares_to_burn_for_withdrawals: u(100),
            shares_requested_to_burn: u(200),
            ..base_input()
        };
        let out = smoothen_token_rebase(100_000_000, &input).unwrap();
        // before the lock the limit is 90
        assert_eq!(out.simulated_shares_to_burn, u(90));
        assert_eq!(out.shares_to_burn, u(181));
    }

    #[test]
    fn test_unlimited_passes_through() {
        let input = SmoothingInput {
            post_cl_balance: u(5_000),
            withdrawal_vault_balance: u(7),
            el_rewards_vault_balance: u(9),
            new_shares_to_burn_for_withdrawals: u(3),
            ..base_input()
        };
        let out = smoothen_token_rebase(UNLIMITED_REBASE, &input).unwrap();
        assert_eq!(out.withdrawals, u(7));
        assert_eq!(out.el_rewards, u(9));
        assert_eq!(out.shares_to_burn, u(3));
    }
}
