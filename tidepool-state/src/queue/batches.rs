//! Finalization batch computation.
//!
//! A batch is a contiguous run of requests priced together. Batches are
//! split wherever consecutive requests fall on different sides of the
//! share rate cap, unless they were created under the same report.

use tidepool_core::constants::share_rate_precision;
use tidepool_core::{BatchesCalculationState, WithdrawalRequest, U256};

use super::withdrawal_queue::WithdrawalQueue;
use crate::error::{StateError, StateResult};

impl WithdrawalQueue {
    /// `(share_rate, steth, shares)` of the range `(pre_start, end]`.
    pub(super) fn calc_batch(
        &self,
        pre_start: &WithdrawalRequest,
        end: &WithdrawalRequest,
    ) -> StateResult<(U256, U256, U256)> {
        let steth = end.cumulative_steth - pre_start.cumulative_steth;
        let shares = end.cumulative_shares - pre_start.cumulative_shares;
        let share_rate = steth
            .mul_div(share_rate_precision(), shares)
            .ok_or(StateError::DivisionByZero {
                context: "batch share rate",
            })?;
        Ok((share_rate, steth, shares))
    }

    /// Extend `state` with the next run of finalizable requests.
    ///
    /// Consumes at most `max_requests_per_call` requests. Stops at the
    /// first request created after `max_timestamp`, at the first request
    /// that does not fit the remaining budget, or when a new batch would
    /// exceed the batch limit. `finished` is set when the queue is exhausted
    /// or the scan stopped before the per-call limit; otherwise pass the
    /// returned state back in to continue.
    pub fn calculate_finalization_batches(
        &self,
        max_share_rate: U256,
        max_timestamp: u64,
        max_requests_per_call: u64,
        mut state: BatchesCalculationState,
    ) -> StateResult<BatchesCalculationState> {
        if state.finished || state.remaining_eth_budget.is_zero() {
            return Err(StateError::InvalidBatchesState);
        }

        let (mut current_id, mut prev_request, mut prev_share_rate) = match state.batches.last() {
            None => {
                let start = self.last_finalized_request_id + 1;
                (start, self.request(start - 1), U256::zero())
            }
            Some(&last_handled) => {
                if last_handled == 0 || last_handled > self.last_request_id() {
                    return Err(StateError::InvalidBatchesState);
                }
                let prev = self.request(last_handled);
                let (rate, _, _) = self.calc_batch(self.request(last_handled - 1), prev)?;
                (last_handled + 1, prev, rate)
            }
        };

        let next_call_request_id = current_id.saturating_add(max_requests_per_call);
        let queue_length = self.last_request_id() + 1;

        while current_id < queue_length && current_id < next_call_request_id {
            let request = self.request(current_id);
            if request.timestamp > max_timestamp {
                break;
            }

            let (share_rate, mut eth_to_finalize, shares) = self.calc_batch(prev_request, request)?;
            if share_rate > max_share_rate {
                eth_to_finalize = shares
                    .mul_div(max_share_rate, share_rate_precision())
                    .ok_or(StateError::ArithmeticOverflow {
                        context: "discounted batch",
                    })?;
            }
            if eth_to_finalize > state.remaining_eth_budget {
                break;
            }

            let extends_last = !state.batches.is_empty()
                && (prev_request.report_timestamp == request.report_timestamp
                    || (prev_share_rate <= max_share_rate && share_rate <= max_share_rate)
                    || (prev_share_rate > max_share_rate && share_rate > max_share_rate));

            if extends_last {
                if let Some(last) = state.batches.last_mut() {
                    *last = current_id;
                }
            } else {
                if state.batches.len() >= self.max_batches_length {
                    break;
                }
                state.batches.push(current_id);
            }
            state.remaining_eth_budget = state.remaining_eth_budget - eth_to_finalize;

            prev_share_rate = share_rate;
            prev_request = request;
            current_id += 1;
        }

        state.finished = current_id == queue_length || current_id < next_call_request_id;
        Ok(state)
    }

    /// Dry-run pricing of `batches`: `(ether_to_lock, shares_to_burn)`.
    ///
    /// Each batch is priced at the lesser of its own rate and
    /// `max_share_rate`. Queue state is not touched.
    pub fn prefinalize(&self, batches: &[u64], max_share_rate: U256) -> StateResult<(U256, U256)> {
        if max_share_rate.is_zero() {
            return Err(StateError::ZeroShareRate);
        }
        let (Some(&first), Some(&last)) = (batches.first(), batches.last()) else {
            return Err(StateError::EmptyBatches);
        };
        if first <= self.last_finalized_request_id {
            return Err(StateError::BatchesNotIncreasing {
                request_id: first,
                previous: self.last_finalized_request_id,
            });
        }
        if last > self.last_request_id() {
            return Err(StateError::InvalidRequestId { request_id: last });
        }

        let mut prev_end_id = self.last_finalized_request_id;
        let mut eth_to_lock = U256::zero();
        let mut shares_to_burn = U256::zero();

        for &end_id in batches {
            if end_id <= prev_end_id {
                return Err(StateError::BatchesNotIncreasing {
                    request_id: end_id,
                    previous: prev_end_id,
                });
            }
            let (share_rate, steth, shares) =
                self.calc_batch(self.request(prev_end_id), self.request(end_id))?;

            let eth = if share_rate > max_share_rate {
                shares
                    .mul_div(max_share_rate, share_rate_precision())
                    .ok_or(StateError::ArithmeticOverflow {
                        context: "discounted batch",
                    })?
            } else {
                steth
            };
            // Both sums are bounded by the cumulative totals.
            eth_to_lock = eth_to_lock + eth;
            shares_to_burn = shares_to_burn + shares;
            prev_end_id = end_id;
        }

        Ok((eth_to_lock, shares_to_burn))
    }
}
