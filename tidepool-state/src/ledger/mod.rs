//! Proportional shares ledger.
//!
//! Balances are share counts; value is derived from the exchange rate
//! `total_pooled_ether / total_shares` supplied by the ledger's owner.
//!
//! - [`SharesReader`]/[`SharesWriter`]: storage seam
//! - [`SharesBook`]: ordered in-memory implementation
//! - free functions for mint, burn, transfer, and rate conversions

mod book;
mod shares;
mod store;

pub use book::SharesBook;
pub use shares::{
    burn_shares, get_shares_by_value, get_value_by_shares, mint_shares, transfer_shares,
};
pub use store::{SharesReader, SharesWriter};
