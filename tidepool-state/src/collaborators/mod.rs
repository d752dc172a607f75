//! External collaborators of the settlement pipeline.
//!
//! The accounting core never reaches into module registries, vaults, or
//! sanity policies directly. It calls them through these traits, bundled
//! per call in [`Collaborators`]. In-memory reference implementations
//! back the tests and the scenario runner.

mod memory;
mod router;
mod sanity;
mod traits;

pub use memory::{MemoryVault, RecordingBurner, RecordingRebaseReceiver};
pub use router::{FixedModuleRouter, ModuleStatus, StakingModuleEntry};
pub use sanity::{
    AcceptAllSanityChecker, DeviationSanityChecker, DEFAULT_REQUEST_TIMESTAMP_MARGIN,
    DEFAULT_SIMULATED_SHARE_RATE_DEVIATION_BP,
};
pub use traits::{
    AccountingReportCheck, Burner, Collaborators, RebaseReceiver, ReportSanityChecker,
    StakingRouter, TokenRebase, Vault, WithdrawalQueueReportCheck,
};
