//! Checkpoint lookup and claim pricing.

use tidepool_core::constants::share_rate_precision;
use tidepool_core::U256;

use super::withdrawal_queue::WithdrawalQueue;
use crate::error::{StateError, StateResult};

impl WithdrawalQueue {
    /// Index of the checkpoint pricing `request_id`, searched within
    /// `[start, end]`.
    ///
    /// Returns `None` when the request is not finalized or lies outside
    /// the window. Requires `start >= 1` and `end <= last_checkpoint_index`.
    pub fn find_checkpoint_hint(&self, request_id: u64, start: u64, end: u64) -> StateResult<Option<u64>> {
        if request_id == 0 || request_id > self.last_request_id() {
            return Err(StateError::InvalidRequestId { request_id });
        }
        let last_checkpoint_index = self.last_checkpoint_index();
        if start == 0 || end > last_checkpoint_index {
            return Err(StateError::InvalidRequestIdRange { start, end });
        }

        if last_checkpoint_index == 0 || request_id > self.last_finalized_request_id || start > end {
            return Ok(None);
        }

        // Right boundary
        if request_id >= self.checkpoint(end).from_request_id {
            if end == last_checkpoint_index {
                return Ok(Some(end));
            }
            if request_id < self.checkpoint(end + 1).from_request_id {
                return Ok(Some(end));
            }
            return Ok(None);
        }

        // Left boundary
        if request_id < self.checkpoint(start).from_request_id {
            return Ok(None);
        }

        let mut min = start;
        let mut max = end - 1;
        while max > min {
            let mid = (max + min + 1) / 2;
            if self.checkpoint(mid).from_request_id <= request_id {
                min = mid;
            } else {
                max = mid - 1;
            }
        }
        Ok(Some(min))
    }

    /// Hints for several requests, over one search window.
    pub fn find_checkpoint_hints(
        &self,
        request_ids: &[u64],
        start: u64,
        end: u64,
    ) -> StateResult<Vec<Option<u64>>> {
        request_ids
            .iter()
            .map(|id| self.find_checkpoint_hint(*id, start, end))
            .collect()
    }

    /// Ether a finalized request would receive when claimed with `hint`.
    ///
    /// The natural value, or `shares * max_share_rate / 1e27` when the
    /// request's own rate exceeds the checkpoint's cap.
    pub fn claimable_ether(&self, request_id: u64, hint: u64) -> StateResult<U256> {
        if request_id == 0 || request_id > self.last_finalized_request_id {
            return Err(StateError::RequestNotFoundOrNotFinalized { request_id });
        }
        let last_checkpoint_index = self.last_checkpoint_index();
        if hint == 0 || hint > last_checkpoint_index {
            return Err(StateError::InvalidHint { request_id, hint });
        }

        let checkpoint = self.checkpoint(hint);
        if request_id < checkpoint.from_request_id {
            return Err(StateError::InvalidHint { request_id, hint });
        }
        if hint < last_checkpoint_index && self.checkpoint(hint + 1).from_request_id <= request_id {
            return Err(StateError::InvalidHint { request_id, hint });
        }

        let (share_rate, eth, shares) =
            self.calc_batch(self.request(request_id - 1), self.request(request_id))?;

        if share_rate > checkpoint.max_share_rate {
            return shares
                .mul_div(checkpoint.max_share_rate, share_rate_precision())
                .ok_or(StateError::ArithmeticOverflow {
                    context: "discounted claim",
                });
        }
        Ok(eth)
    }
}
