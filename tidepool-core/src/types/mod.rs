//! Core protocol data types.
//!
//! - Withdrawal requests, their status view, and pricing checkpoints
//! - Resumable finalization batch state
//! - Oracle report payload
//! - Staking rewards distribution produced by the routing collaborator

mod distribution;
mod report;
mod withdrawal;

pub use distribution::{ModuleId, StakingRewardsDistribution};
pub use report::OracleReport;
pub use withdrawal::{
    BatchesCalculationState, Checkpoint, WithdrawalRequest, WithdrawalRequestStatus,
};
