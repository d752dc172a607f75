//! Min-first allocation across capacity-bounded buckets.
//!
//! Places a quantity by repeatedly topping up the least-filled buckets,
//! keeping tied buckets level. Used for spreading validator deposits
//! across staking modules.

mod deposits;
mod min_first;

pub use deposits::{deposits_allocation, DepositsAllocation, ModuleAllocationInput};
pub use min_first::{allocate, allocate_to_best_candidate, AllocationUnit};
