//! Oracle report settlement.
//!
//! [`Pool::handle_oracle_report`](crate::Pool::handle_oracle_report) runs
//! the nine report steps against a scratch copy of the pool. Calls into
//! collaborators that change their state are queued in an [`EffectLog`]
//! and dispatched only once the scratch copy has been committed, so an
//! aborted report leaves both the pool and its collaborators untouched.

mod context;
mod effects;
mod fees;
mod pipeline;

pub use context::ReportOutcome;
pub use effects::{Effect, EffectLog, VaultKind};
pub use fees::{fee_distribution_basis_points, FeeBasisPoints};
