//! FIFO withdrawal queue.
//!
//! Requests are appended with running totals of value and shares, so any
//! contiguous range is priced by subtracting two entries. Finalization
//! appends one [`Checkpoint`](tidepool_core::Checkpoint) carrying the
//! share rate cap for the newly finalized range; claims locate their
//! checkpoint by binary search.
//!
//! Request lifecycle: `Pending -> Finalized -> Claimed`.

mod batches;
mod checkpoints;
mod withdrawal_queue;

pub use withdrawal_queue::{ClaimedWithdrawal, WithdrawalQueue};
