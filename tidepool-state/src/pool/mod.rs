//! The pool aggregate.
//!
//! Owns the shares ledger, the withdrawal queue, and the pooled-ether
//! counters. Total pooled ether is derived:
//! `buffered + cl_balance + (deposited - cl_validators) * 32 ether`.
//! Spending allowances sit next to the ledger.

mod allowances;
mod operations;
mod state;

pub use state::Pool;
