//! Deposit placement across staking modules.

use tidepool_core::constants::TOTAL_BASIS_POINTS;

use super::min_first::allocate;

/// Per-module figures the allocation needs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModuleAllocationInput {
    /// Validators currently active in the module.
    pub active_validators: u64,
    /// Validators the module can still take deposits for.
    pub available_validators: u64,
    /// Target share of all active validators, in basis points.
    pub target_share: u64,
}

/// Result of [`deposits_allocation`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DepositsAllocation {
    /// Deposits actually placed.
    pub allocated: u64,
    /// Validator count per module after placement, parallel to the input.
    pub allocations: Vec<u64>,
}

impl DepositsAllocation {
    /// New deposits assigned to module `index`.
    pub fn new_deposits(&self, index: usize, modules: &[ModuleAllocationInput]) -> u64 {
        match (self.allocations.get(index), modules.get(index)) {
            (Some(total), Some(module)) => total.saturating_sub(module.active_validators),
            _ => 0,
        }
    }
}

/// Spread `deposits_to_allocate` new validators across modules.
///
/// Each module is capped at `min(target_share * (active + new) / 10000,
/// active + available)`; placement is min-first from current counts.
pub fn deposits_allocation(
    modules: &[ModuleAllocationInput],
    deposits_to_allocate: u64,
) -> DepositsAllocation {
    if modules.is_empty() {
        return DepositsAllocation::default();
    }

    let total_validators = modules
        .iter()
        .fold(0u64, |acc, m| acc.saturating_add(m.active_validators))
        .saturating_add(deposits_to_allocate);

    let mut allocations: Vec<u64> = modules.iter().map(|m| m.active_validators).collect();
    let capacities: Vec<u64> = modules
        .iter()
        .map(|m| {
            let target = u64::try_from(
                m.target_share as u128 * total_validators as u128 / TOTAL_BASIS_POINTS as u128,
            )
            .unwrap_or(u64::MAX);
            target.min(m.active_validators.saturating_add(m.available_validators))
        })
        .collect();

    let allocated = allocate(&mut allocations, &capacities, deposits_to_allocate);
    DepositsAllocation {
        allocated,
        allocations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(active: u64, available: u64, target_share: u64) -> ModuleAllocationInput {
        ModuleAllocationInput {
            active_validators: active,
            available_validators: available,
            target_share,
        }
    }

    #[test]
    fn test_no_modules() {
        let result = deposits_allocation(&[], 10);
        assert_eq!(result.allocated, 0);
        assert!(result.allocations.is_empty());
    }

    #[test]
    fn test_single_module_limited_by_keys() {
        let modules = [module(10, 3, 10_000)];
        let result = deposits_allocation(&modules, 10);
        assert_eq!(result.allocated, 3);
        assert_eq!(result.allocations, vec![13]);
        assert_eq!(result.new_deposits(0, &modules), 3);
    }

    #[test]
    fn test_target_share_caps_module() {
        // total after deposits = 0 + 0 + 10 = 10
        // module A target 30% -> cap 3, module B 100% -> cap 10
        let modules = [module(0, 100, 3_000), module(0, 100, 10_000)];
        let result = deposits_allocation(&modules, 10);
        assert_eq!(result.allocated, 10);
        assert_eq!(result.allocations, vec![3, 7]);
    }

    #[test]
    fn test_lagging_module_catches_up() {
        let modules = [module(2, 100, 10_000), module(8, 100, 10_000)];
        let result = deposits_allocation(&modules, 4);
        assert_eq!(result.allocations, vec![6, 8]);
        assert_eq!(result.new_deposits(1, &modules), 0);
    }

    #[test]
    fn test_oversized_target_share_saturates() {
        // 2^63 bp of 20000 validators is 2^64, one past u64::MAX
        let modules = [module(0, 50, 1 << 63)];
        let result = deposits_allocation(&modules, 20_000);
        assert_eq!(result.allocated, 50);
        assert_eq!(result.allocations, vec![50]);
    }
}
