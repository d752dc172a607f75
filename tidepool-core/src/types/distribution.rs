//! Staking rewards distribution.

use serde::{Deserialize, Serialize};

use crate::constants::FEE_PRECISION_POINTS;
use crate::crypto::Address;
use crate::u256::U256;

/// Identifier of a staking module.
pub type ModuleId = u64;

/// Fee split for one settlement, in `precision_points` precision.
///
/// `recipients`, `module_ids` and `modules_fees` are parallel. A module
/// that earns no fee (stopped) still has an entry with a zero fee.
/// `total_fee` covers the module fees plus the treasury's part.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingRewardsDistribution {
    /// Fee recipients, one per module.
    pub recipients: Vec<Address>,
    /// Module ids, parallel to `recipients`.
    pub module_ids: Vec<ModuleId>,
    /// Per-module fee.
    pub modules_fees: Vec<U256>,
    /// Aggregate fee including the treasury's part.
    pub total_fee: U256,
    /// Precision base of every fee figure.
    pub precision_points: U256,
}

impl StakingRewardsDistribution {
    /// No recipients, no fee.
    pub fn empty() -> Self {
        Self {
            recipients: Vec::new(),
            module_ids: Vec::new(),
            modules_fees: Vec::new(),
            total_fee: U256::zero(),
            precision_points: U256::from_u128(FEE_PRECISION_POINTS),
        }
    }

    /// Sum of the per-module fees.
    pub fn modules_fee_sum(&self) -> U256 {
        self.modules_fees
            .iter()
            .fold(U256::zero(), |acc, fee| acc.saturating_add(*fee))
    }
}

impl Default for StakingRewardsDistribution {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_distribution() {
        let d = StakingRewardsDistribution::empty();
        assert!(d.recipients.is_empty());
        assert!(d.total_fee.is_zero());
        assert_eq!(d.precision_points, U256::from_u128(FEE_PRECISION_POINTS));
    }

    #[test]
    fn test_modules_fee_sum() {
        let mut d = StakingRewardsDistribution::empty();
        d.modules_fees = vec![U256::from(3u64), U256::zero(), U256::from(4u64)];
        assert_eq!(d.modules_fee_sum(), U256::from(7u64));
    }
}
