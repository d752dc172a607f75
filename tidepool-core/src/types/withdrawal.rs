//! Withdrawal queue records.

use serde::{Deserialize, Serialize};

use crate::crypto::Address;
use crate::u256::U256;

/// A queued withdrawal request.
///
/// Amounts are stored as running totals over the whole queue so any
/// contiguous range can be priced with one subtraction. The request at
/// index 0 is a sentinel with zero totals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    /// Sum of requested value up to and including this request.
    pub cumulative_steth: U256,
    /// Sum of requested shares up to and including this request.
    pub cumulative_shares: U256,
    /// Owner of the request.
    pub owner: Address,
    /// Creation time, supplied by the caller.
    pub timestamp: u64,
    /// Set once the request has been claimed.
    pub claimed: bool,
    /// Last oracle report timestamp at the time the request was created.
    pub report_timestamp: u64,
}

impl WithdrawalRequest {
    /// The index-0 anchor. Marked claimed so it can never be claimed.
    pub fn sentinel() -> Self {
        Self {
            claimed: true,
            ..Self::default()
        }
    }
}

/// Read-only view of a single request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequestStatus {
    /// Value requested.
    pub amount_of_steth: U256,
    /// Shares locked in the request.
    pub amount_of_shares: U256,
    /// Owner of the request.
    pub owner: Address,
    /// Creation time.
    pub timestamp: u64,
    /// Whether the request has been finalized.
    pub is_finalized: bool,
    /// Whether the request has been claimed.
    pub is_claimed: bool,
}

/// Prices every finalized request from `from_request_id` up to the next
/// checkpoint's start at `max_share_rate` (1e27 precision).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// First request id priced by this checkpoint.
    pub from_request_id: u64,
    /// Share rate cap in effect at finalization.
    pub max_share_rate: U256,
}

/// Streaming state of `calculate_finalization_batches`.
///
/// Callers pass the returned state back in to continue across calls.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchesCalculationState {
    /// Ether still available to lock.
    pub remaining_eth_budget: U256,
    /// True once the unfinalized range has been fully consumed.
    pub finished: bool,
    /// Ending request id of each batch, strictly increasing.
    pub batches: Vec<u64>,
}

impl BatchesCalculationState {
    /// Fresh state with the given ether budget.
    pub fn new(remaining_eth_budget: U256) -> Self {
        Self {
            remaining_eth_budget,
            finished: false,
            batches: Vec::new(),
        }
    }

    /// Number of batches computed so far.
    pub fn batches_length(&self) -> usize {
        self.batches.len()
    }
}
