//! Protocol fee minting and the basis-point fee view.

use tidepool_core::constants::TOTAL_BASIS_POINTS;
use tidepool_core::{StakingRewardsDistribution, U256};
use tracing::debug;

use super::effects::{Effect, EffectLog};
use crate::error::{StateError, StateResult};
use crate::pool::Pool;

/// Check the parallel arrays and fee bound of a distribution.
pub(crate) fn validate_distribution(distribution: &StakingRewardsDistribution) -> StateResult<()> {
    if distribution.recipients.len() != distribution.modules_fees.len() {
        return Err(StateError::WrongRecipientsInput {
            recipients: distribution.recipients.len(),
            fees: distribution.modules_fees.len(),
        });
    }
    if distribution.module_ids.len() != distribution.recipients.len() {
        return Err(StateError::WrongModuleIdsInput {
            module_ids: distribution.module_ids.len(),
            recipients: distribution.recipients.len(),
        });
    }
    if distribution.total_fee > distribution.precision_points {
        return Err(StateError::TotalFeeExceedsPrecision {
            total_fee: distribution.total_fee,
            precision: distribution.precision_points,
        });
    }
    Ok(())
}

/// Shares to mint so the fee recipients end up owning `total_fee` of
/// `total_rewards` after dilution:
///
/// `rewards * fee * pre_shares / ((pre_ether + rewards) * precision - rewards * fee)`
pub(crate) fn fee_shares_to_mint(
    distribution: &StakingRewardsDistribution,
    pre_total_pooled_ether: U256,
    pre_total_shares: U256,
    total_rewards: U256,
) -> StateResult<U256> {
    let overflow = |context: &'static str| StateError::ArithmeticOverflow { context };

    let rewards_fee = total_rewards
        .checked_mul(distribution.total_fee)
        .ok_or(overflow("rewards times fee"))?;
    let numerator = rewards_fee
        .checked_mul(pre_total_shares)
        .ok_or(overflow("fee shares numerator"))?;
    let denominator = pre_total_pooled_ether
        .checked_add(total_rewards)
        .and_then(|ether| ether.checked_mul(distribution.precision_points))
        .ok_or(overflow("fee shares denominator"))?
        .checked_sub(rewards_fee)
        .ok_or(overflow("fee shares denominator"))?;
    if denominator.is_zero() {
        return Err(StateError::DivisionByZero {
            context: "fee shares",
        });
    }
    Ok(numerator / denominator)
}

impl Pool {
    /// Mint fee shares for `total_rewards` and split them between the
    /// module recipients and the treasury. Returns the shares minted.
    pub(crate) fn distribute_fee(
        &mut self,
        distribution: &StakingRewardsDistribution,
        pre_total_pooled_ether: U256,
        pre_total_shares: U256,
        total_rewards: U256,
        effects: &mut EffectLog,
    ) -> StateResult<U256> {
        validate_distribution(distribution)?;
        if distribution.total_fee.is_zero() {
            return Ok(U256::zero());
        }

        let shares_minted = fee_shares_to_mint(
            distribution,
            pre_total_pooled_ether,
            pre_total_shares,
            total_rewards,
        )?;
        let pool_account = self.config.addresses.pool;
        self.mint_shares(pool_account, shares_minted)?;

        let module_rewards = self.transfer_module_rewards(distribution, shares_minted)?;
        let total_module_rewards = module_rewards
            .iter()
            .fold(U256::zero(), |acc, shares| acc + *shares);
        // Floor division keeps the module sum at or below the minted total.
        let treasury_reward = shares_minted - total_module_rewards;
        self.transfer_shares(pool_account, self.config.addresses.treasury, treasury_reward)?;

        debug!(
            %total_rewards,
            %shares_minted,
            %treasury_reward,
            "protocol fee distributed"
        );
        effects.record(Effect::RewardsMinted {
            module_ids: distribution.module_ids.clone(),
            shares: module_rewards,
        });
        Ok(shares_minted)
    }

    fn transfer_module_rewards(
        &mut self,
        distribution: &StakingRewardsDistribution,
        shares_minted: U256,
    ) -> StateResult<Vec<U256>> {
        let pool_account = self.config.addresses.pool;
        let mut rewards = vec![U256::zero(); distribution.recipients.len()];

        for (i, (recipient, fee)) in distribution
            .recipients
            .iter()
            .zip(&distribution.modules_fees)
            .enumerate()
        {
            if fee.is_zero() {
                continue;
            }
            let reward = shares_minted
                .mul_div(*fee, distribution.total_fee)
                .ok_or(StateError::ArithmeticOverflow {
                    context: "module reward",
                })?;
            self.transfer_shares(pool_account, *recipient, reward)?;
            rewards[i] = reward;
        }
        Ok(rewards)
    }
}

/// Fee split in basis points of the rewards' fee part.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeeBasisPoints {
    pub treasury: u64,
    /// Always zero; kept for the three-way split consumers expect.
    pub insurance: u64,
    pub operators: u64,
}

fn to_e4(value: U256, precision: U256) -> StateResult<U256> {
    if precision.is_zero() {
        return Ok(U256::zero());
    }
    value
        .mul_div(U256::from(TOTAL_BASIS_POINTS), precision)
        .ok_or(StateError::ArithmeticOverflow {
            context: "fee basis points",
        })
}

/// Treasury and operator shares of the total fee in basis points.
///
/// A distribution without fee reports an all-zero split.
pub fn fee_distribution_basis_points(
    distribution: &StakingRewardsDistribution,
) -> StateResult<FeeBasisPoints> {
    let precision = distribution.precision_points;
    let total_e4 = to_e4(distribution.total_fee, precision)?;
    if total_e4.is_zero() {
        return Ok(FeeBasisPoints::default());
    }

    let modules_fee = distribution.modules_fee_sum();
    let treasury_fee = distribution.total_fee.saturating_sub(modules_fee);
    let bp = U256::from(TOTAL_BASIS_POINTS);
    let share_of_total = |fee: U256| -> StateResult<u64> {
        let points = to_e4(fee, precision)?
            .checked_mul(bp)
            .map(|scaled| scaled / total_e4)
            .filter(|points| *points <= U256::from(u64::MAX))
            .ok_or(StateError::ArithmeticOverflow {
                context: "fee basis points",
            })?;
        Ok(points.low_u64())
    };

    Ok(FeeBasisPoints {
        treasury: share_of_total(treasury_fee)?,
        insurance: 0,
        operators: share_of_total(modules_fee)?,
    })
}
