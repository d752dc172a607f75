//! Checked integer helpers used by the accounting formulas.
//!
//! All divisions truncate toward zero. The protocol never rounds a value
//! up in a holder's favour, so `mul_div` is the workhorse for every
//! exchange-rate conversion.

use super::U256;

impl U256 {
    /// `self * numerator / denominator`, floor-rounded.
    ///
    /// Returns `None` on multiplication overflow or a zero denominator.
    pub fn mul_div(&self, numerator: U256, denominator: U256) -> Option<U256> {
        if denominator.is_zero() {
            return None;
        }
        self.checked_mul(numerator).map(|product| product / denominator)
    }

    /// Ceiling division. Returns `None` for a zero divisor.
    pub fn ceil_div(&self, divisor: U256) -> Option<U256> {
        if divisor.is_zero() {
            return None;
        }
        let (quotient, remainder) = self.div_mod(divisor);
        if remainder.is_zero() {
            Some(quotient)
        } else {
            Some(quotient + U256::one())
        }
    }
}
