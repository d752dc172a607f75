//! Positive token rebase limiter.
//!
//! Bounds how much pooled ether a single report may add. The limiter is
//! created fresh for every settlement from the pre-report totals and is
//! never persisted.

mod positive_rebase;
mod smoothing;

pub use positive_rebase::TokenRebaseLimiter;
pub use smoothing::{smoothen_token_rebase, SmoothenedRebase, SmoothingInput};
