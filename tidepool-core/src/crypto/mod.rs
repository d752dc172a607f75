//! Account identifiers.
//!
//! Accounts are 20-byte addresses. Component accounts (the pool, the
//! treasury, the burner, the withdrawal queue) and scenario participants
//! are derived from human-readable labels by hashing, so a configuration
//! can name them without carrying raw bytes.

mod address;
mod hashing;

pub use address::{derive_address, Address};
pub use hashing::{sha256, sha256_concat};
