use tidepool_core::constants::{LIMITER_PRECISION_BASE, UNLIMITED_REBASE};
use tidepool_core::U256;

use crate::error::{StateError, StateResult};

/// Per-report rebase limiter state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenRebaseLimiter {
    current_total_pooled_ether: U256,
    pre_total_pooled_ether: U256,
    pre_total_shares: U256,
    positive_rebase_limit: u64,
    max_total_pooled_ether: U256,
}

impl TokenRebaseLimiter {
    /// Initialize from pre-report totals.
    ///
    /// `rebase_limit` is a fraction in 1e9 precision or [`UNLIMITED_REBASE`].
    /// An empty pool is always unlimited.
    pub fn init(
        rebase_limit: u64,
        pre_total_pooled_ether: U256,
        pre_total_shares: U256,
    ) -> StateResult<Self> {
        if rebase_limit == 0 {
            return Err(StateError::InvalidRebaseLimit { limit: rebase_limit });
        }

        let positive_rebase_limit = if pre_total_pooled_ether.is_zero() {
            UNLIMITED_REBASE
        } else {
            rebase_limit
        };

        let max_total_pooled_ether = if positive_rebase_limit == UNLIMITED_REBASE {
            U256::MAX
        } else {
            let headroom = pre_total_pooled_ether
                .mul_div(U256::from(positive_rebase_limit), U256::from(LIMITER_PRECISION_BASE))
                .ok_or(StateError::ArithmeticOverflow {
                    context: "rebase limiter ceiling",
                })?;
            pre_total_pooled_ether
                .checked_add(headroom)
                .ok_or(StateError::ArithmeticOverflow {
                    context: "rebase limiter ceiling",
                })?
        };

        Ok(Self {
            current_total_pooled_ether: pre_total_pooled_ether,
            pre_total_pooled_ether,
            pre_total_shares,
            positive_rebase_limit,
            max_total_pooled_ether,
        })
    }

    /// True in unlimited mode.
    pub fn is_unlimited(&self) -> bool {
        self.positive_rebase_limit == UNLIMITED_REBASE
    }

    /// True once the ceiling has been reached.
    pub fn is_limit_reached(&self) -> bool {
        self.current_total_pooled_ether >= self.max_total_pooled_ether
    }

    /// Pooled ether as tracked so far.
    pub fn current_total_pooled_ether(&self) -> U256 {
        self.current_total_pooled_ether
    }

    /// Ceiling on tracked pooled ether.
    pub fn max_total_pooled_ether(&self) -> U256 {
        self.max_total_pooled_ether
    }

    /// Effective limit (the sentinel in unlimited mode).
    pub fn positive_rebase_limit(&self) -> u64 {
        self.positive_rebase_limit
    }

    /// Subtract ether. No-op when unlimited.
    pub fn decrease_ether(&mut self, amount: U256) -> StateResult<()> {
        if self.is_unlimited() {
            return Ok(());
        }
        if amount > self.current_total_pooled_ether {
            return Err(StateError::NegativeTotalPooledEther {
                current: self.current_total_pooled_ether,
                amount,
            });
        }
        self.current_total_pooled_ether = self.current_total_pooled_ether - amount;
        Ok(())
    }

    /// Add ether up to the ceiling, returning the amount actually applied.
    pub fn increase_ether(&mut self, amount: U256) -> U256 {
        if self.is_unlimited() {
            return amount;
        }
        let prev = self.current_total_pooled_ether;
        self.current_total_pooled_ether = prev
            .saturating_add(amount)
            .min(self.max_total_pooled_ether);
        self.current_total_pooled_ether.saturating_sub(prev)
    }

    /// Max shares that can be burned without the rate exceeding the limit.
    pub fn shares_to_burn_limit(&self) -> StateResult<U256> {
        if self.is_unlimited() {
            return Ok(self.pre_total_shares);
        }
        if self.is_limit_reached() {
            return Ok(U256::zero());
        }

        let base = U256::from(LIMITER_PRECISION_BASE);
        let rebase_limit_plus_one = U256::from(self.positive_rebase_limit) + base;
        let pooled_ether_rate = self
            .current_total_pooled_ether
            .mul_div(base, self.pre_total_pooled_ether)
            .ok_or(StateError::DivisionByZero {
                context: "shares to burn limit",
            })?;

        // Below the ceiling the rate is at most limit + 1.
        self.pre_total_shares
            .mul_div(
                rebase_limit_plus_one.saturating_sub(pooled_ether_rate),
                rebase_limit_plus_one,
            )
            .ok_or(StateError::ArithmeticOverflow {
                context: "shares to burn limit",
            })
    }
}
