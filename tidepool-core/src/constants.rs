//! Fixed protocol constants.
//!
//! These values must be reproduced exactly for numerical compatibility with
//! other implementations of the protocol. None of them are configurable.

use crate::u256::U256;

/// One ether in wei.
pub const ETHER: u64 = 1_000_000_000_000_000_000;

/// Basis points in a whole (100%).
pub const TOTAL_BASIS_POINTS: u64 = 10_000;

/// Precision base of the positive rebase limit (1e9 == 100%).
pub const LIMITER_PRECISION_BASE: u64 = 1_000_000_000;

/// Sentinel rebase limit meaning "no limit".
pub const UNLIMITED_REBASE: u64 = u64::MAX;

/// Default maximum positive rebase per report (0.075% in 1e9 precision).
pub const DEFAULT_MAX_POSITIVE_TOKEN_REBASE: u64 = 750_000;

/// Precision of fee shares reported by the routing collaborator (1e20 == 100%).
pub const FEE_PRECISION_POINTS: u128 = 100_000_000_000_000_000_000;

/// Precision of share rates used by the withdrawal queue (1e27).
pub const SHARE_RATE_PRECISION: u128 = 1_000_000_000_000_000_000_000_000_000;

/// Ether deposited per validator (32 ether).
pub const DEPOSIT_SIZE: u128 = 32 * ETHER as u128;

/// Maximum number of finalization batches a single report may carry.
pub const MAX_BATCHES_LENGTH: usize = 36;

/// Smallest withdrawal request accepted by default (wei).
pub const DEFAULT_MIN_WITHDRAWAL_AMOUNT: u64 = 100;

/// Largest withdrawal request accepted by default (1000 ether).
pub const DEFAULT_MAX_WITHDRAWAL_AMOUNT: u128 = 1_000 * ETHER as u128;

/// `SHARE_RATE_PRECISION` as a U256.
#[inline]
pub fn share_rate_precision() -> U256 {
    U256::from_u128(SHARE_RATE_PRECISION)
}

/// `FEE_PRECISION_POINTS` as a U256.
#[inline]
pub fn fee_precision_points() -> U256 {
    U256::from_u128(FEE_PRECISION_POINTS)
}

/// `DEPOSIT_SIZE` as a U256.
#[inline]
pub fn deposit_size() -> U256 {
    U256::from_u128(DEPOSIT_SIZE)
}
