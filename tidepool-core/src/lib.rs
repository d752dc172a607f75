//! # Tidepool Core
//!
//! Core types, arithmetic, and serialization for the Tidepool liquid-staking
//! accounting core.
//!
//! This crate provides the foundation the state machine builds on:
//! - 256-bit unsigned arithmetic for share-rate and fee math
//! - Fixed protocol constants (precision bases, deposit size)
//! - Account addresses and label-based address derivation
//! - Withdrawal request, checkpoint, and oracle report types
//! - Deterministic binary snapshots

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod constants;
pub mod crypto;
pub mod error;
pub mod serialization;
pub mod types;
pub mod u256;

pub use crypto::{derive_address, Address};
pub use error::{CoreError, SerializationError};
pub use types::{
    BatchesCalculationState, Checkpoint, ModuleId, OracleReport, StakingRewardsDistribution,
    WithdrawalRequest, WithdrawalRequestStatus,
};
pub use u256::U256;
