//! Static staking module table.

use serde::{Deserialize, Serialize};
use tidepool_core::constants::{deposit_size, fee_precision_points, TOTAL_BASIS_POINTS};
use tidepool_core::{Address, ModuleId, StakingRewardsDistribution, U256};

use super::traits::StakingRouter;
use crate::allocation::{deposits_allocation, ModuleAllocationInput};
use crate::error::{StateError, StateResult};

/// Module lifecycle status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleStatus {
    #[default]
    Active,
    DepositsPaused,
    /// Earns no module fee; its part of the fee goes to the treasury.
    Stopped,
}

/// One row of the module table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingModuleEntry {
    pub id: ModuleId,
    /// Receives the module's fee shares.
    pub recipient: Address,
    /// Module fee in basis points of the rewards.
    pub module_fee: u64,
    /// Treasury fee in basis points of the rewards.
    pub treasury_fee: u64,
    /// Target share of all validators in basis points.
    pub target_share: u64,
    #[serde(default)]
    pub status: ModuleStatus,
    #[serde(default)]
    pub active_validators: u64,
    /// Validators the module still has keys for.
    #[serde(default)]
    pub available_validators: u64,
}

/// Router over a fixed module table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixedModuleRouter {
    modules: Vec<StakingModuleEntry>,
    /// Fee shares credited per module id.
    pub minted_rewards: Vec<(ModuleId, U256)>,
}

impl FixedModuleRouter {
    pub fn new(modules: Vec<StakingModuleEntry>) -> Self {
        Self {
            modules,
            minted_rewards: Vec::new(),
        }
    }

    pub fn modules(&self) -> &[StakingModuleEntry] {
        &self.modules
    }

    pub fn module(&self, module_id: ModuleId) -> Option<&StakingModuleEntry> {
        self.modules.iter().find(|m| m.id == module_id)
    }

    pub fn set_status(&mut self, module_id: ModuleId, status: ModuleStatus) -> bool {
        match self.modules.iter_mut().find(|m| m.id == module_id) {
            Some(module) => {
                module.status = status;
                true
            }
            None => false,
        }
    }

    fn allocation_inputs(&self) -> Vec<ModuleAllocationInput> {
        self.modules
            .iter()
            .map(|m| ModuleAllocationInput {
                active_validators: m.active_validators,
                available_validators: if m.status == ModuleStatus::Active {
                    m.available_validators
                } else {
                    0
                },
                target_share: m.target_share,
            })
            .collect()
    }
}

impl StakingRouter for FixedModuleRouter {
    fn get_staking_rewards_distribution(&self) -> StateResult<StakingRewardsDistribution> {
        let total_active: u64 = self.modules.iter().map(|m| m.active_validators).sum();
        if self.modules.is_empty() || total_active == 0 {
            return Ok(StakingRewardsDistribution::empty());
        }

        let precision = fee_precision_points();
        let bp = U256::from(TOTAL_BASIS_POINTS);
        let mut distribution = StakingRewardsDistribution::empty();

        for module in self.modules.iter().filter(|m| m.active_validators > 0) {
            let validators_share = precision * U256::from(module.active_validators)
                / U256::from(total_active);
            let module_fee = validators_share * U256::from(module.module_fee) / bp;
            let treasury_fee = validators_share * U256::from(module.treasury_fee) / bp;

            distribution.recipients.push(module.recipient);
            distribution.module_ids.push(module.id);
            distribution.modules_fees.push(if module.status == ModuleStatus::Stopped {
                U256::zero()
            } else {
                module_fee
            });
            distribution.total_fee = distribution.total_fee + module_fee + treasury_fee;
        }

        if distribution.total_fee > precision {
            return Err(StateError::TotalFeeExceedsPrecision {
                total_fee: distribution.total_fee,
                precision,
            });
        }
        Ok(distribution)
    }

    fn report_rewards_minted(&mut self, module_ids: &[ModuleId], shares: &[U256]) {
        for (id, minted) in module_ids.iter().zip(shares) {
            if !minted.is_zero() {
                self.minted_rewards.push((*id, *minted));
            }
        }
    }

    fn max_deposits_count(&self, module_id: ModuleId, max_deposits_value: U256) -> u64 {
        let Some(index) = self.modules.iter().position(|m| m.id == module_id) else {
            return 0;
        };
        let deposits = (max_deposits_value / deposit_size()).to_u64().unwrap_or(u64::MAX);
        let inputs = self.allocation_inputs();
        deposits_allocation(&inputs, deposits).new_deposits(index, &inputs)
    }

    fn deposit(&mut self, deposit_value: U256, deposits_count: u64, module_id: ModuleId) -> StateResult<()> {
        let module = self
            .modules
            .iter_mut()
            .find(|m| m.id == module_id)
            .ok_or_else(|| StateError::DepositRejected {
                module_id,
                reason: "unknown module".to_string(),
            })?;
        if module.status != ModuleStatus::Active {
            return Err(StateError::DepositRejected {
                module_id,
                reason: format!("module is {:?}", module.status),
            });
        }
        if deposit_value != deposit_size() * U256::from(deposits_count) {
            return Err(StateError::DepositRejected {
                module_id,
                reason: format!("{deposit_value} wei does not cover {deposits_count} deposits"),
            });
        }
        if deposits_count > module.available_validators {
            return Err(StateError::DepositRejected {
                module_id,
                reason: format!(
                    "{deposits_count} deposits exceed {} available keys",
                    module.available_validators
                ),
            });
        }

        module.available_validators -= deposits_count;
        module.active_validators += deposits_count;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidepool_core::derive_address;

    fn entry(id: ModuleId, active: u64, available: u64) -> StakingModuleEntry {
        StakingModuleEntry {
            id,
            recipient: derive_address(&format!("module-{id}")),
            module_fee: 500,
            treasury_fee: 500,
            target_share: 10_000,
            status: ModuleStatus::Active,
            active_validators: active,
            available_validators: available,
        }
    }

    #[test]
    fn test_empty_router_distribution() {
        let router = FixedModuleRouter::new(vec![entry(1, 0, 10)]);
        let d = router.get_staking_rewards_distribution().unwrap();
        assert!(d.recipients.is_empty());
        assert!(d.total_fee.is_zero());
        assert_eq!(d.precision_points, fee_precision_points());
    }

    #[test]
    fn test_distribution_by_validator_share() {
        // 3:1 split, 5% + 5% each
        let router = FixedModuleRouter::new(vec![entry(1, 30, 0), entry(2, 10, 0), entry(3, 0, 5)]);
        let d = router.get_staking_rewards_distribution().unwrap();
        let p = fee_precision_points();
        assert_eq!(d.module_ids, vec![1, 2]);
        assert_eq!(d.modules_fees[0], p * U256::from(3u64) / U256::from(4u64) / U256::from(20u64));
        assert_eq!(d.modules_fees[1], p / U256::from(4u64) / U256::from(20u64));
        // 10% of rewards overall
        assert_eq!(d.total_fee, p / U256::from(10u64));
    }

    #[test]
    fn test_stopped_module_fee_goes_to_treasury() {
        let mut router = FixedModuleRouter::new(vec![entry(1, 10, 0), entry(2, 10, 0)]);
        router.set_status(2, ModuleStatus::Stopped);
        let d = router.get_staking_rewards_distribution().unwrap();
        assert_eq!(d.recipients.len(), 2);
        assert!(d.modules_fees[1].is_zero());
        assert_eq!(d.total_fee, fee_precision_points() / U256::from(10u64));
    }

    #[test]
    fn test_fee_over_precision_rejected() {
        let mut bad = entry(1, 10, 0);
        bad.module_fee = 9_000;
        bad.treasury_fee = 2_000;
        let router = FixedModuleRouter::new(vec![bad]);
        assert!(matches!(
            router.get_staking_rewards_distribution(),
            Err(StateError::TotalFeeExceedsPrecision { .. })
        ));
    }

    #[test]
    fn test_max_deposits_count() {
        let router = FixedModuleRouter::new(vec![entry(1, 2, 5), entry(2, 8, 5)]);
        // 4 deposits of ether available
        let value = deposit_size() * U256::from(4u64);
        assert_eq!(router.max_deposits_count(1, value), 4);
        assert_eq!(router.max_deposits_count(2, value), 0);
        assert_eq!(router.max_deposits_count(9, value), 0);
    }

    #[test]
    fn test_deposit_rejections() {
        let mut router = FixedModuleRouter::new(vec![entry(1, 0, 2)]);
        let one = deposit_size();
        assert!(router.deposit(one, 2, 1).is_err());
        assert!(router.deposit(one * U256::from(3u64), 3, 1).is_err());
        router.set_status(1, ModuleStatus::DepositsPaused);
        assert!(router.deposit(one, 1, 1).is_err());
        router.set_status(1, ModuleStatus::Active);
        router.deposit(one, 1, 1).unwrap();
        assert_eq!(router.module(1).unwrap().active_validators, 1);
        assert_eq!(router.module(1).unwrap().available_validators, 1);
    }
}
