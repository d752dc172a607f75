//! Account addresses.
//!
//! An address is 20 bytes. Labelled addresses are the first 20 bytes of
//! SHA-256("tidepool:" || label).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::hashing::sha256_concat;

const LABEL_DOMAIN: &[u8] = b"tidepool:";

/// A 20-byte account identifier.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// True for the all-zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut bytes)?;
        Ok(Address(bytes))
    }
}

/// Derive a stable address from a label.
pub fn derive_address(label: &str) -> Address {
    let hash = sha256_concat(&[LABEL_DOMAIN, label.as_bytes()]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[..20]);
    Address(address)
}
