use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tidepool_core::constants::deposit_size;
use tidepool_core::serialization::{decode_snapshot, encode_snapshot};
use tidepool_core::{Address, U256};
use tracing::info;

use crate::config::ProtocolConfig;
use crate::error::{StateError, StateResult};
use crate::ledger::{self, SharesBook, SharesReader};
use crate::queue::WithdrawalQueue;

/// Pooled ether, the shares ledger, and the withdrawal queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub(crate) config: ProtocolConfig,
    pub(crate) shares: SharesBook,
    /// `(owner, spender) -> value`; zero allowances are not stored.
    pub(crate) allowances: BTreeMap<(Address, Address), U256>,
    pub(crate) queue: WithdrawalQueue,
    pub(crate) buffered_ether: U256,
    pub(crate) cl_balance: U256,
    pub(crate) cl_validators: u64,
    pub(crate) deposited_validators: u64,
    pub(crate) total_el_rewards_collected: U256,
    pub(crate) last_report_timestamp: u64,
}

impl Pool {
    /// Empty, uninitialized pool.
    pub fn new(config: ProtocolConfig) -> StateResult<Self> {
        config.validate()?;
        Ok(Self {
            queue: WithdrawalQueue::new(config.max_batches_length),
            config,
            shares: SharesBook::new(),
            allowances: BTreeMap::new(),
            buffered_ether: U256::zero(),
            cl_balance: U256::zero(),
            cl_validators: 0,
            deposited_validators: 0,
            total_el_rewards_collected: U256::zero(),
            last_report_timestamp: 0,
        })
    }

    /// Bootstrap: mint `initial_balance` shares 1:1 to the initial holder
    /// and buffer the balance. Allowed once, while no shares exist.
    ///
    /// Also grants the burner an infinite allowance over the queue account.
    pub fn initialize(&mut self, initial_balance: U256) -> StateResult<U256> {
        if initial_balance.is_zero() {
            return Err(StateError::ZeroBootstrapBalance);
        }
        if !self.shares.total_shares().is_zero() {
            return Err(StateError::AlreadyInitialized);
        }

        let holder = self.config.addresses.initial_holder;
        ledger::mint_shares(&mut self.shares, &holder, initial_balance)?;
        self.buffered_ether = initial_balance;
        let addresses = &self.config.addresses;
        self.allowances
            .insert((addresses.withdrawal_queue, addresses.burner), U256::MAX);

        info!(%holder, %initial_balance, "pool bootstrapped");
        Ok(initial_balance)
    }

    pub fn is_initialized(&self) -> bool {
        !self.shares.total_shares().is_zero()
    }

    fn ensure_initialized(&self) -> StateResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(StateError::NotInitialized)
        }
    }

    /// Stake `value` and mint the corresponding shares to `sender`.
    pub fn submit(&mut self, sender: Address, value: U256) -> StateResult<U256> {
        self.ensure_initialized()?;
        if value.is_zero() {
            return Err(StateError::ZeroDeposit);
        }

        let shares = self.get_shares_by_pooled_eth(value)?;
        let buffered = self
            .buffered_ether
            .checked_add(value)
            .ok_or(StateError::ArithmeticOverflow {
                context: "buffered ether",
            })?;
        ledger::mint_shares(&mut self.shares, &sender, shares)?;
        self.buffered_ether = buffered;
        Ok(shares)
    }

    // === Totals ===

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn queue(&self) -> &WithdrawalQueue {
        &self.queue
    }

    pub fn buffered_ether(&self) -> U256 {
        self.buffered_ether
    }

    /// Ether deposited to validators not yet visible on the consensus layer.
    pub fn transient_balance(&self) -> U256 {
        // deposited >= cl_validators is enforced on every report
        deposit_size() * U256::from(self.deposited_validators.saturating_sub(self.cl_validators))
    }

    pub fn total_pooled_ether(&self) -> U256 {
        self.buffered_ether
            .saturating_add(self.cl_balance)
            .saturating_add(self.transient_balance())
    }

    pub fn total_shares(&self) -> U256 {
        self.shares.total_shares()
    }

    /// `(deposited_validators, cl_validators, cl_balance)`.
    pub fn beacon_stat(&self) -> (u64, u64, U256) {
        (self.deposited_validators, self.cl_validators, self.cl_balance)
    }

    pub fn total_el_rewards_collected(&self) -> U256 {
        self.total_el_rewards_collected
    }

    pub fn last_report_timestamp(&self) -> u64 {
        self.last_report_timestamp
    }

    // === Shares ===

    pub fn shares_of(&self, account: &Address) -> U256 {
        self.shares.shares_of(account)
    }

    pub fn shares_book(&self) -> &SharesBook {
        &self.shares
    }

    /// Value of an account's shares at the current rate.
    pub fn balance_of(&self, account: &Address) -> StateResult<U256> {
        self.get_pooled_eth_by_shares(self.shares_of(account))
    }

    pub fn get_shares_by_pooled_eth(&self, value: U256) -> StateResult<U256> {
        ledger::get_shares_by_value(&self.shares, value, self.total_pooled_ether())
    }

    pub fn get_pooled_eth_by_shares(&self, shares: U256) -> StateResult<U256> {
        ledger::get_value_by_shares(&self.shares, shares, self.total_pooled_ether())
    }

    pub fn transfer_shares(&mut self, from: Address, to: Address, shares: U256) -> StateResult<()> {
        ledger::transfer_shares(&mut self.shares, &from, &to, shares)
    }

    /// Value-denominated transfer. Returns the shares moved.
    pub fn transfer(&mut self, from: Address, to: Address, value: U256) -> StateResult<U256> {
        let shares = self.get_shares_by_pooled_eth(value)?;
        ledger::transfer_shares(&mut self.shares, &from, &to, shares)?;
        Ok(shares)
    }

    pub(crate) fn mint_shares(&mut self, recipient: Address, shares: U256) -> StateResult<U256> {
        ledger::mint_shares(&mut self.shares, &recipient, shares)
    }

    pub(crate) fn burn_shares(&mut self, account: Address, shares: U256) -> StateResult<U256> {
        ledger::burn_shares(&mut self.shares, &account, shares)
    }

    // === Snapshots ===

    /// Deterministic binary snapshot.
    pub fn snapshot_bytes(&self) -> StateResult<Vec<u8>> {
        Ok(encode_snapshot(self)?)
    }

    /// Restore from [`Pool::snapshot_bytes`].
    pub fn from_snapshot_bytes(bytes: &[u8]) -> StateResult<Self> {
        let pool: Pool = decode_snapshot(bytes)?;
        pool.config.validate()?;
        Ok(pool)
    }
}
