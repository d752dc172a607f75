//! Scenario file format.
//!
//! Accounts are named by label and mapped to addresses with
//! [`derive_address`]; `0x`-prefixed strings are taken as literal
//! addresses. Amounts are wei, as integers or decimal strings.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tidepool_core::{derive_address, Address, ModuleId, U256};
use tidepool_state::{ModuleStatus, ProtocolConfig, StakingModuleEntry};

/// A complete scenario: setup plus an ordered list of actions.
#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: ProtocolConfig,
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
    #[serde(default)]
    pub sanity: SanityPolicy,
    pub actions: Vec<Action>,
}

/// One staking module of the router table.
#[derive(Clone, Debug, Deserialize)]
pub struct ModuleSpec {
    pub id: ModuleId,
    /// Account receiving the module's fee shares.
    pub recipient: String,
    pub module_fee: u64,
    pub treasury_fee: u64,
    pub target_share: u64,
    #[serde(default)]
    pub status: ModuleStatus,
    #[serde(default)]
    pub available_validators: u64,
}

impl ModuleSpec {
    pub fn to_entry(&self) -> anyhow::Result<StakingModuleEntry> {
        Ok(StakingModuleEntry {
            id: self.id,
            recipient: resolve_account(&self.recipient)?,
            module_fee: self.module_fee,
            treasury_fee: self.treasury_fee,
            target_share: self.target_share,
            status: self.status,
            active_validators: 0,
            available_validators: self.available_validators,
        })
    }
}

/// Report sanity policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanityPolicy {
    AcceptAll,
    #[default]
    Deviation,
}

/// Vault selector for funding actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultName {
    Withdrawal,
    ElRewards,
}

/// One protocol action.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Bootstrap {
        amount: U256,
    },
    Submit {
        account: String,
        amount: U256,
    },
    Deposit {
        module_id: ModuleId,
        max_deposits: u64,
    },
    RequestWithdrawal {
        account: String,
        amount: U256,
        timestamp: u64,
    },
    /// Ether arriving in a vault (exits, priority fees).
    FundVault {
        vault: VaultName,
        amount: U256,
    },
    /// Oracle report. Vault balances are read from the vaults; with
    /// `finalize` the batches are computed from the queue.
    Report {
        timestamp: u64,
        time_elapsed: u64,
        cl_validators: u64,
        post_cl_balance: U256,
        #[serde(default)]
        shares_requested_to_burn: U256,
        #[serde(default)]
        finalize: bool,
        #[serde(default)]
        simulated_share_rate: Option<U256>,
    },
    Claim {
        account: String,
        request_id: u64,
    },
    Approve {
        owner: String,
        spender: String,
        amount: U256,
    },
    /// Value transfer by `spender` out of `from`, spending its allowance.
    TransferFrom {
        spender: String,
        from: String,
        to: String,
        amount: U256,
    },
    SetBunkerMode {
        active: bool,
    },
    SetModuleStatus {
        module_id: ModuleId,
        status: ModuleStatus,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Bootstrap { .. } => "bootstrap",
            Action::Submit { .. } => "submit",
            Action::Deposit { .. } => "deposit",
            Action::RequestWithdrawal { .. } => "request_withdrawal",
            Action::FundVault { .. } => "fund_vault",
            Action::Report { .. } => "report",
            Action::Claim { .. } => "claim",
            Action::Approve { .. } => "approve",
            Action::TransferFrom { .. } => "transfer_from",
            Action::SetBunkerMode { .. } => "set_bunker_mode",
            Action::SetModuleStatus { .. } => "set_module_status",
        }
    }
}

/// Map a label or `0x` hex string to an address.
pub fn resolve_account(account: &str) -> anyhow::Result<Address> {
    if account.starts_with("0x") {
        account
            .parse()
            .with_context(|| format!("invalid address {account}"))
    } else {
        Ok(derive_address(account))
    }
}

/// Read and parse a scenario file.
pub fn load(path: &Path) -> anyhow::Result<Scenario> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario {}", path.display()))?;
    let scenario: Scenario = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse scenario {}", path.display()))?;
    scenario
        .config
        .validate()
        .context("invalid protocol config")?;
    Ok(scenario)
}
