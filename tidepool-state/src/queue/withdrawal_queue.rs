use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tidepool_core::constants::MAX_BATCHES_LENGTH;
use tidepool_core::{Address, Checkpoint, WithdrawalRequest, WithdrawalRequestStatus, U256};
use tracing::debug;

use crate::error::{StateError, StateResult};

/// Ether released by a successful claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimedWithdrawal {
    pub request_id: u64,
    pub owner: Address,
    pub recipient: Address,
    pub amount_of_eth: U256,
}

/// Append-only request ledger with its checkpoint index.
///
/// Index 0 of both `requests` and `checkpoints` is a sentinel, so the
/// last request id equals `requests.len() - 1`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalQueue {
    pub(super) requests: Vec<WithdrawalRequest>,
    pub(super) checkpoints: Vec<Checkpoint>,
    pub(super) last_finalized_request_id: u64,
    pub(super) locked_ether_amount: U256,
    requests_by_owner: BTreeMap<Address, BTreeSet<u64>>,
    last_report_timestamp: u64,
    bunker_mode: bool,
    pub(super) max_batches_length: usize,
}

impl Default for WithdrawalQueue {
    fn default() -> Self {
        Self::new(MAX_BATCHES_LENGTH)
    }
}

impl WithdrawalQueue {
    /// Empty queue holding only the sentinels.
    pub fn new(max_batches_length: usize) -> Self {
        Self {
            requests: vec![WithdrawalRequest::sentinel()],
            checkpoints: vec![Checkpoint::default()],
            last_finalized_request_id: 0,
            locked_ether_amount: U256::zero(),
            requests_by_owner: BTreeMap::new(),
            last_report_timestamp: 0,
            bunker_mode: false,
            max_batches_length,
        }
    }

    pub fn last_request_id(&self) -> u64 {
        (self.requests.len() - 1) as u64
    }

    pub fn last_finalized_request_id(&self) -> u64 {
        self.last_finalized_request_id
    }

    pub fn last_checkpoint_index(&self) -> u64 {
        (self.checkpoints.len() - 1) as u64
    }

    /// Ether reserved for finalized but unclaimed requests.
    pub fn locked_ether_amount(&self) -> U256 {
        self.locked_ether_amount
    }

    pub fn last_report_timestamp(&self) -> u64 {
        self.last_report_timestamp
    }

    pub fn max_batches_length(&self) -> usize {
        self.max_batches_length
    }

    pub fn is_bunker_mode_active(&self) -> bool {
        self.bunker_mode
    }

    /// Toggle bunker mode. While active, the pool refuses deposits.
    pub fn set_bunker_mode(&mut self, active: bool) {
        self.bunker_mode = active;
    }

    /// Record the report timestamp new requests inherit.
    pub fn on_oracle_report(&mut self, report_timestamp: u64) {
        self.last_report_timestamp = report_timestamp;
    }

    pub fn unfinalized_request_number(&self) -> u64 {
        self.last_request_id() - self.last_finalized_request_id
    }

    /// Value requested but not yet finalized.
    pub fn unfinalized_steth(&self) -> U256 {
        self.request(self.last_request_id()).cumulative_steth
            - self.request(self.last_finalized_request_id).cumulative_steth
    }

    /// Unclaimed request ids of an owner, ascending.
    pub fn requests_of(&self, owner: &Address) -> Vec<u64> {
        self.requests_by_owner
            .get(owner)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub(super) fn request(&self, id: u64) -> &WithdrawalRequest {
        &self.requests[id as usize]
    }

    pub(super) fn checkpoint(&self, index: u64) -> &Checkpoint {
        &self.checkpoints[index as usize]
    }

    /// Append a request and return its id.
    ///
    /// A request must lock at least one share; batch pricing divides by it.
    pub fn enqueue(
        &mut self,
        amount_of_steth: U256,
        amount_of_shares: U256,
        owner: Address,
        now: u64,
    ) -> StateResult<u64> {
        if amount_of_shares.is_zero() {
            return Err(StateError::ZeroSharesRequest);
        }
        let last = self.request(self.last_request_id());
        let cumulative_steth = last
            .cumulative_steth
            .checked_add(amount_of_steth)
            .ok_or(StateError::ArithmeticOverflow {
                context: "cumulative steth",
            })?;
        let cumulative_shares = last
            .cumulative_shares
            .checked_add(amount_of_shares)
            .ok_or(StateError::ArithmeticOverflow {
                context: "cumulative shares",
            })?;

        let request_id = self.last_request_id() + 1;
        self.requests.push(WithdrawalRequest {
            cumulative_steth,
            cumulative_shares,
            owner,
            timestamp: now,
            claimed: false,
            report_timestamp: self.last_report_timestamp,
        });
        self.requests_by_owner
            .entry(owner)
            .or_default()
            .insert(request_id);

        debug!(request_id, %owner, %amount_of_steth, "withdrawal request enqueued");
        Ok(request_id)
    }

    /// Status view of one request.
    pub fn get_status(&self, request_id: u64) -> StateResult<WithdrawalRequestStatus> {
        if request_id == 0 || request_id > self.last_request_id() {
            return Err(StateError::InvalidRequestId { request_id });
        }
        let request = self.request(request_id);
        let previous = self.request(request_id - 1);
        Ok(WithdrawalRequestStatus {
            amount_of_steth: request.cumulative_steth - previous.cumulative_steth,
            amount_of_shares: request.cumulative_shares - previous.cumulative_shares,
            owner: request.owner,
            timestamp: request.timestamp,
            is_finalized: request_id <= self.last_finalized_request_id,
            is_claimed: request.claimed,
        })
    }

    /// Finalize every request up to `last_request_id_to_finalize`.
    ///
    /// Appends one checkpoint at the first newly finalized id priced at
    /// `max_share_rate` and reserves `amount_of_eth` for claims.
    pub fn finalize(
        &mut self,
        last_request_id_to_finalize: u64,
        amount_of_eth: U256,
        max_share_rate: U256,
    ) -> StateResult<()> {
        if last_request_id_to_finalize > self.last_request_id()
            || last_request_id_to_finalize <= self.last_finalized_request_id
        {
            return Err(StateError::InvalidRequestId {
                request_id: last_request_id_to_finalize,
            });
        }

        let owed = self.request(last_request_id_to_finalize).cumulative_steth
            - self.request(self.last_finalized_request_id).cumulative_steth;
        if amount_of_eth > owed {
            return Err(StateError::TooMuchEtherToFinalize {
                amount: amount_of_eth,
                owed,
            });
        }
        let locked = self
            .locked_ether_amount
            .checked_add(amount_of_eth)
            .ok_or(StateError::ArithmeticOverflow {
                context: "locked ether",
            })?;

        let first_request_id = self.last_finalized_request_id + 1;
        self.checkpoints.push(Checkpoint {
            from_request_id: first_request_id,
            max_share_rate,
        });
        self.locked_ether_amount = locked;
        self.last_finalized_request_id = last_request_id_to_finalize;

        debug!(
            from = first_request_id,
            to = last_request_id_to_finalize,
            %amount_of_eth,
            checkpoint = self.last_checkpoint_index(),
            "withdrawal requests finalized"
        );
        Ok(())
    }

    /// Claim a finalized request using a checkpoint hint.
    pub fn claim(
        &mut self,
        request_id: u64,
        hint: u64,
        recipient: Address,
    ) -> StateResult<ClaimedWithdrawal> {
        if request_id == 0 {
            return Err(StateError::InvalidRequestId { request_id });
        }
        if request_id > self.last_finalized_request_id {
            return Err(StateError::RequestNotFoundOrNotFinalized { request_id });
        }
        if self.request(request_id).claimed {
            return Err(StateError::RequestAlreadyClaimed { request_id });
        }

        let amount_of_eth = self.claimable_ether(request_id, hint)?;
        let locked = self
            .locked_ether_amount
            .checked_sub(amount_of_eth)
            .ok_or(StateError::InsufficientBufferedEther {
                available: self.locked_ether_amount,
                required: amount_of_eth,
            })?;

        let owner = self.request(request_id).owner;
        self.requests[request_id as usize].claimed = true;
        if let Some(ids) = self.requests_by_owner.get_mut(&owner) {
            ids.remove(&request_id);
            if ids.is_empty() {
                self.requests_by_owner.remove(&owner);
            }
        }
        self.locked_ether_amount = locked;

        debug!(request_id, %recipient, %amount_of_eth, "withdrawal claimed");
        Ok(ClaimedWithdrawal {
            request_id,
            owner,
            recipient,
            amount_of_eth,
        })
    }
}
