//! Ledger operations.
//!
//! Every operation checks before it writes, so a failed call leaves the
//! store untouched.

use tidepool_core::{Address, U256};

use super::store::{SharesReader, SharesWriter};
use crate::error::{StateError, StateResult};

/// Mint new shares to an account.
pub fn mint_shares<S: SharesWriter>(
    state: &mut S,
    recipient: &Address,
    shares: U256,
) -> StateResult<U256> {
    let new_total = state
        .total_shares()
        .checked_add(shares)
        .ok_or(StateError::ArithmeticOverflow {
            context: "mint total shares",
        })?;
    // Per-account balance is bounded by the total.
    let new_balance = state.shares_of(recipient) + shares;

    state.set_total_shares(new_total);
    state.set_shares(recipient, new_balance);
    Ok(new_total)
}

/// Burn shares held by an account.
pub fn burn_shares<S: SharesWriter>(
    state: &mut S,
    account: &Address,
    shares: U256,
) -> StateResult<U256> {
    let available = state.shares_of(account);
    if shares > available {
        return Err(StateError::InsufficientShares {
            account: *account,
            available,
            required: shares,
        });
    }

    let new_total = state.total_shares() - shares;
    state.set_total_shares(new_total);
    state.set_shares(account, available - shares);
    Ok(new_total)
}

/// Move shares between accounts.
pub fn transfer_shares<S: SharesWriter>(
    state: &mut S,
    from: &Address,
    to: &Address,
    shares: U256,
) -> StateResult<()> {
    let available = state.shares_of(from);
    if shares > available {
        return Err(StateError::InsufficientShares {
            account: *from,
            available,
            required: shares,
        });
    }
    if from == to {
        return Ok(());
    }

    state.set_shares(from, available - shares);
    let credited = state.shares_of(to) + shares;
    state.set_shares(to, credited);
    Ok(())
}

/// `value * total_shares / total_pooled_ether`, floored.
///
/// Zero pooled ether yields zero shares.
pub fn get_shares_by_value<S: SharesReader>(
    state: &S,
    value: U256,
    total_pooled_ether: U256,
) -> StateResult<U256> {
    if total_pooled_ether.is_zero() {
        return Ok(U256::zero());
    }
    value
        .mul_div(state.total_shares(), total_pooled_ether)
        .ok_or(StateError::ArithmeticOverflow {
            context: "shares by value",
        })
}

/// `shares * total_pooled_ether / total_shares`, floored.
///
/// An empty supply yields zero value.
pub fn get_value_by_shares<S: SharesReader>(
    state: &S,
    shares: U256,
    total_pooled_ether: U256,
) -> StateResult<U256> {
    let total_shares = state.total_shares();
    if total_shares.is_zero() {
        return Ok(U256::zero());
    }
    shares
        .mul_div(total_pooled_ether, total_shares)
        .ok_or(StateError::ArithmeticOverflow {
            context: "value by shares",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::SharesBook;
    use proptest::prelude::*;
    use tidepool_core::derive_address;

    fn u(n: u64) -> U256 {
        U256::from(n)
    }

    fn book_with(holdings: &[(&str, u64)]) -> SharesBook {
        let mut book = SharesBook::new();
        for (label, shares) in holdings {
            mint_shares(&mut book, &derive_address(label), u(*shares)).unwrap();
        }
        book
    }

    #[test]
    fn test_mint_updates_total() {
        let book = book_with(&[("alice", 10), ("bob", 5)]);
        assert_eq!(book.total_shares(), u(15));
        assert_eq!(book.shares_of(&derive_address("alice")), u(10));
    }

    #[test]
    fn test_burn_more_than_held_fails_without_mutation() {
        let mut book = book_with(&[("alice", 10)]);
        let alice = derive_address("alice");
        let err = burn_shares(&mut book, &alice, u(11)).unwrap_err();
        assert!(matches!(err, StateError::InsufficientShares { .. }));
        assert_eq!(book.shares_of(&alice), u(10));
        assert_eq!(book.total_shares(), u(10));
    }

    #[test]
    fn test_transfer_insufficient() {
        let mut book = book_with(&[("alice", 3)]);
        let result = transfer_shares(&mut book, &derive_address("alice"), &derive_address("bob"), u(4));
        assert!(matches!(result, Err(StateError::InsufficientShares { .. })));
    }

    #[test]
    fn test_transfer_to_self_is_noop() {
        let mut book = book_with(&[("alice", 3)]);
        let alice = derive_address("alice");
        transfer_shares(&mut book, &alice, &alice, u(3)).unwrap();
        assert_eq!(book.shares_of(&alice), u(3));
    }

    #[test]
    fn test_conversions_floor() {
        // 3 shares over 10 ether: 1 ether buys 0.3 shares -> 0
        let book = book_with(&[("alice", 3)]);
        assert_eq!(get_shares_by_value(&book, u(1), u(10)).unwrap(), u(0));
        // 2 shares are worth 20/3 = 6.66 -> 6
        assert_eq!(get_value_by_shares(&book, u(2), u(10)).unwrap(), u(6));
    }

    #[test]
    fn test_conversions_on_empty_supply() {
        let book = SharesBook::new();
        assert!(get_value_by_shares(&book, u(5), u(0)).unwrap().is_zero());
        assert!(get_shares_by_value(&book, u(5), u(0)).unwrap().is_zero());
    }

    #[derive(Clone, Debug)]
    enum Op {
        Mint(usize, u64),
        Burn(usize, u64),
        Transfer(usize, usize, u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..4usize, 0..1_000u64).prop_map(|(a, n)| Op::Mint(a, n)),
            (0..4usize, 0..1_000u64).prop_map(|(a, n)| Op::Burn(a, n)),
            (0..4usize, 0..4usize, 0..1_000u64).prop_map(|(a, b, n)| Op::Transfer(a, b, n)),
        ]
    }

    proptest! {
        #[test]
        fn prop_sum_of_balances_equals_total(ops in prop::collection::vec(op(), 0..64)) {
            let accounts: Vec<Address> =
                ["a", "b", "c", "d"].iter().map(|l| derive_address(l)).collect();
            let mut book = SharesBook::new();
            for op in ops {
                // Failures are expected for over-burns; they must not mutate.
                let _ = match op {
                    Op::Mint(a, n) => mint_shares(&mut book, &accounts[a], u(n)).map(|_| ()),
                    Op::Burn(a, n) => burn_shares(&mut book, &accounts[a], u(n)).map(|_| ()),
                    Op::Transfer(a, b, n) => transfer_shares(&mut book, &accounts[a], &accounts[b], u(n)),
                };
                let sum = accounts
                    .iter()
                    .fold(U256::zero(), |acc, a| acc + book.shares_of(a));
                prop_assert_eq!(sum, book.total_shares());
            }
        }

        #[test]
        fn prop_round_trip_never_creates_value(
            total_shares in 1..1_000_000_000u64,
            pooled in 1..1_000_000_000u64,
            value in 0..1_000_000_000u64,
        ) {
            let book = book_with(&[("alice", total_shares)]);
            let shares = get_shares_by_value(&book, u(value), u(pooled)).unwrap();
            let back = get_value_by_shares(&book, shares, u(pooled)).unwrap();
            prop_assert!(back <= u(value));
            if (value as u128 * total_shares as u128) % pooled as u128 == 0 {
                prop_assert_eq!(back, u(value));
            }
        }
    }
}
