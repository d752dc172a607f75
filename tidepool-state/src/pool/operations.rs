use tidepool_core::constants::deposit_size;
use tidepool_core::{Address, ModuleId, U256};
use tracing::{debug, info};

use super::Pool;
use crate::collaborators::StakingRouter;
use crate::error::{StateError, StateResult};
use crate::queue::ClaimedWithdrawal;

impl Pool {
    /// Buffered ether not reserved for unfinalized withdrawal requests.
    pub fn depositable_ether(&self) -> U256 {
        self.buffered_ether
            .saturating_sub(self.queue.unfinalized_steth())
    }

    pub fn can_deposit(&self) -> bool {
        !self.queue.is_bunker_mode_active()
    }

    pub fn is_bunker_mode_active(&self) -> bool {
        self.queue.is_bunker_mode_active()
    }

    pub fn set_bunker_mode(&mut self, active: bool) {
        if active != self.queue.is_bunker_mode_active() {
            info!(active, "bunker mode changed");
        }
        self.queue.set_bunker_mode(active);
    }

    /// Send up to `max_deposits_count` validator deposits to a module.
    ///
    /// The router may reject; the buffer only moves after it accepted.
    /// Returns the number of deposits made.
    pub fn deposit(
        &mut self,
        max_deposits_count: u64,
        module_id: ModuleId,
        router: &mut dyn StakingRouter,
    ) -> StateResult<u64> {
        if !self.can_deposit() {
            return Err(StateError::CannotDeposit);
        }

        let depositable = self.depositable_ether();
        let count = max_deposits_count.min(router.max_deposits_count(module_id, depositable));
        if count == 0 {
            return Ok(0);
        }

        let value = deposit_size() * U256::from(count);
        let buffered = self
            .buffered_ether
            .checked_sub(value)
            .ok_or(StateError::InsufficientBufferedEther {
                available: self.buffered_ether,
                required: value,
            })?;
        let deposited = self
            .deposited_validators
            .checked_add(count)
            .ok_or(StateError::ArithmeticOverflow {
                context: "deposited validators",
            })?;

        router.deposit(value, count, module_id)?;
        self.buffered_ether = buffered;
        self.deposited_validators = deposited;

        debug!(module_id, count, %value, "deposited to module");
        Ok(count)
    }

    /// Lock `value` worth of the owner's shares in a new withdrawal request.
    pub fn request_withdrawal(&mut self, owner: Address, value: U256, now: u64) -> StateResult<u64> {
        let min = self.config.min_withdrawal_amount;
        let max = self.config.max_withdrawal_amount;
        if value < min {
            return Err(StateError::RequestAmountTooSmall {
                amount: value,
                minimum: min,
            });
        }
        if value > max {
            return Err(StateError::RequestAmountTooLarge {
                amount: value,
                maximum: max,
            });
        }

        let shares = self.get_shares_by_pooled_eth(value)?;
        if shares.is_zero() {
            return Err(StateError::RequestAmountTooSmall {
                amount: value,
                minimum: min,
            });
        }

        let available = self.shares_of(&owner);
        if available < shares {
            return Err(StateError::InsufficientShares {
                account: owner,
                available,
                required: shares,
            });
        }

        // The queue account holds the locked shares until finalization
        // moves them to the burner. Enqueue fails before writing, and the
        // funded transfer after it cannot.
        let request_id = self.queue.enqueue(value, shares, owner, now)?;
        let queue_account = self.config.addresses.withdrawal_queue;
        self.transfer_shares(owner, queue_account, shares)?;
        Ok(request_id)
    }

    /// Claim a finalized request; the released ether leaves the pool's books.
    pub fn claim_withdrawal(
        &mut self,
        request_id: u64,
        hint: u64,
        recipient: Address,
    ) -> StateResult<ClaimedWithdrawal> {
        self.queue.claim(request_id, hint, recipient)
    }
}
