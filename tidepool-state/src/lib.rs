// U256 doesn't implement AddAssign/SubAssign
#![allow(clippy::assign_op_pattern)]
// Settlement helpers carry the whole report context
#![allow(clippy::too_many_arguments)]

//! Accounting state machine for the Tidepool liquid-staking pool.
//!
//! Balances are shares of a pool whose total value moves with oracle
//! reports. Everything here is deterministic and in memory: timestamps
//! are inputs, and vaults, module routing, and report sanity policy sit
//! behind collaborator traits.
//!
//! # Key Components
//!
//! - [`Pool`]: the aggregate owning the shares ledger, the buffered and
//!   consensus-layer counters, and the [`WithdrawalQueue`]
//! - [`Pool::handle_oracle_report`]: the atomic nine-step settlement
//! - [`TokenRebaseLimiter`]: per-report cap on positive rebases
//! - [`allocate`]: min-first allocation used for deposits
//! - [`StateError`]: error type for every failed operation
//!
//! # Example
//!
//! ```ignore
//! use tidepool_state::{Pool, ProtocolConfig};
//!
//! let mut pool = Pool::new(ProtocolConfig::default())?;
//! pool.initialize(U256::ether(1))?;
//! let outcome = pool.handle_oracle_report(&report, &mut collaborators)?;
//! ```

mod allocation;
mod collaborators;
mod config;
mod error;
mod ledger;
mod limiter;
mod pool;
mod queue;
mod settlement;

pub use allocation::{
    allocate, allocate_to_best_candidate, deposits_allocation, AllocationUnit, DepositsAllocation,
    ModuleAllocationInput,
};
pub use collaborators::{
    AcceptAllSanityChecker, AccountingReportCheck, Burner, Collaborators, DeviationSanityChecker,
    FixedModuleRouter, MemoryVault, ModuleStatus, RebaseReceiver, RecordingBurner,
    RecordingRebaseReceiver, ReportSanityChecker, StakingModuleEntry, StakingRouter, TokenRebase,
    Vault, WithdrawalQueueReportCheck, DEFAULT_REQUEST_TIMESTAMP_MARGIN,
    DEFAULT_SIMULATED_SHARE_RATE_DEVIATION_BP,
};
pub use config::{ProtocolAddresses, ProtocolConfig};
pub use error::{StateError, StateResult};
pub use ledger::{
    burn_shares, get_shares_by_value, get_value_by_shares, mint_shares, transfer_shares,
    SharesBook, SharesReader, SharesWriter,
};
pub use limiter::{smoothen_token_rebase, SmoothenedRebase, SmoothingInput, TokenRebaseLimiter};
pub use pool::Pool;
pub use queue::{ClaimedWithdrawal, WithdrawalQueue};
pub use settlement::{
    fee_distribution_basis_points, Effect, EffectLog, FeeBasisPoints, ReportOutcome, VaultKind,
};
