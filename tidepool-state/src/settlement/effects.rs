//! Collaborator calls recorded during settlement.
//!
//! Settlement runs on a scratch pool, so writes to the burner, vaults,
//! router and rebase receiver are queued here and dispatched only after
//! the scratch state is committed.

use tidepool_core::{Address, ModuleId, U256};

use crate::collaborators::{Collaborators, TokenRebase};

/// Which vault a withdrawal draws from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VaultKind {
    Withdrawal,
    ElRewards,
}

/// A collaborator call deferred until the report commits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    RequestBurnShares { from: Address, shares: U256 },
    WithdrawFromVault { vault: VaultKind, amount: U256 },
    CommitSharesToBurn { shares: U256 },
    RewardsMinted { module_ids: Vec<ModuleId>, shares: Vec<U256> },
    PostRebase(TokenRebase),
}

/// Ordered list of deferred collaborator calls.
#[derive(Clone, Debug, Default)]
pub struct EffectLog {
    effects: Vec<Effect>,
}

impl EffectLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Apply every effect in recording order.
    pub fn dispatch(self, collaborators: &mut Collaborators<'_>) {
        for effect in self.effects {
            match effect {
                Effect::RequestBurnShares { from, shares } => {
                    collaborators.burner.request_burn_shares(from, shares)
                }
                Effect::WithdrawFromVault { vault, amount } => match vault {
                    VaultKind::Withdrawal => collaborators.withdrawal_vault.withdraw(amount),
                    VaultKind::ElRewards => collaborators.el_rewards_vault.withdraw(amount),
                },
                Effect::CommitSharesToBurn { shares } => {
                    collaborators.burner.commit_shares_to_burn(shares)
                }
                Effect::RewardsMinted { module_ids, shares } => {
                    collaborators.router.report_rewards_minted(&module_ids, &shares)
                }
                Effect::PostRebase(rebase) => {
                    if let Some(receiver) = collaborators.rebase_receiver.as_mut() {
                        receiver.on_post_rebase(&rebase);
                    }
                }
            }
        }
    }
}
