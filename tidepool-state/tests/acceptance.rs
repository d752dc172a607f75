//! End-to-end behavior of the pool, queue, and limiter through the
//! public API.

use tidepool_core::constants::{share_rate_precision, UNLIMITED_REBASE};
use tidepool_core::{derive_address, BatchesCalculationState, OracleReport, U256};
use tidepool_state::{
    Collaborators, DeviationSanityChecker, FixedModuleRouter, MemoryVault, ModuleStatus, Pool,
    ProtocolConfig, RecordingBurner, RecordingRebaseReceiver, ReportOutcome, SharesReader,
    StakingModuleEntry, StateError, StateResult, TokenRebaseLimiter, WithdrawalQueue,
    DEFAULT_REQUEST_TIMESTAMP_MARGIN,
};

fn u(n: u64) -> U256 {
    U256::from(n)
}

fn ether(n: u64) -> U256 {
    U256::ether(n)
}

#[test]
fn scenario_a_bootstrap() {
    let mut pool = Pool::new(ProtocolConfig::default()).unwrap();
    assert!(pool.total_shares().is_zero());

    pool.initialize(u(100)).unwrap();
    let holder = pool.config().addresses.initial_holder;
    assert_eq!(pool.total_shares(), u(100));
    assert_eq!(pool.shares_of(&holder), u(100));
    assert_eq!(pool.buffered_ether(), u(100));

    assert_eq!(pool.initialize(u(100)), Err(StateError::AlreadyInitialized));
}

#[test]
fn scenario_b_submit() {
    let mut pool = Pool::new(ProtocolConfig::default()).unwrap();
    pool.initialize(u(100)).unwrap();
    assert_eq!(pool.total_pooled_ether(), u(100));

    let alice = derive_address("alice");
    assert_eq!(pool.submit(alice, u(50)).unwrap(), u(50));
    assert_eq!(pool.shares_of(&alice), u(50));
    assert_eq!(pool.buffered_ether(), u(150));
}

#[test]
fn scenario_c_limiter_unlimited_at_zero_supply() {
    let mut limiter = TokenRebaseLimiter::init(750_000, U256::zero(), U256::zero()).unwrap();
    assert!(limiter.is_unlimited());
    assert_eq!(limiter.positive_rebase_limit(), UNLIMITED_REBASE);
    assert_eq!(limiter.increase_ether(ether(1_000)), ether(1_000));
}

#[test]
fn scenario_d_withdrawal_claim() {
    let mut queue = WithdrawalQueue::default();
    let owner = derive_address("alice");
    let id = queue.enqueue(u(10), u(10), owner, 0).unwrap();
    assert!(!queue.get_status(id).unwrap().is_finalized);

    queue.finalize(id, u(10), share_rate_precision()).unwrap();
    assert_eq!(queue.last_checkpoint_index(), 1);

    let hint = queue.find_checkpoint_hint(id, 1, 1).unwrap();
    assert_eq!(hint, Some(1));
    let claimed = queue.claim(id, 1, owner).unwrap();
    assert_eq!(claimed.amount_of_eth, u(10));
    assert!(queue.locked_ether_amount().is_zero());
}

#[test]
fn scenario_e_discounted_claim() {
    let mut queue = WithdrawalQueue::default();
    let owner = derive_address("alice");
    let id = queue.enqueue(u(10), u(5), owner, 0).unwrap();

    let rate = share_rate_precision();
    let (ether_to_lock, shares_to_burn) = queue.prefinalize(&[id], rate).unwrap();
    assert_eq!(ether_to_lock, u(5));
    assert_eq!(shares_to_burn, u(5));

    queue.finalize(id, ether_to_lock, rate).unwrap();
    assert_eq!(queue.claimable_ether(id, 1).unwrap(), u(5));
    assert_eq!(queue.claim(id, 1, owner).unwrap().amount_of_eth, u(5));
}

struct Protocol {
    pool: Pool,
    router: FixedModuleRouter,
    burner: RecordingBurner,
    withdrawal_vault: MemoryVault,
    el_rewards_vault: MemoryVault,
    receiver: RecordingRebaseReceiver,
    checker: DeviationSanityChecker,
}

impl Protocol {
    fn new() -> Self {
        let mut pool = Pool::new(ProtocolConfig::default()).unwrap();
        pool.initialize(ether(32)).unwrap();
        Self {
            pool,
            router: FixedModuleRouter::new(vec![StakingModuleEntry {
                id: 1,
                recipient: derive_address("curated-module"),
                module_fee: 500,
                treasury_fee: 500,
                target_share: 10_000,
                status: ModuleStatus::Active,
                active_validators: 0,
                available_validators: 10,
            }]),
            burner: RecordingBurner::new(),
            withdrawal_vault: MemoryVault::default(),
            el_rewards_vault: MemoryVault::default(),
            receiver: RecordingRebaseReceiver::default(),
            checker: DeviationSanityChecker::default(),
        }
    }

    fn report(&mut self, report: &OracleReport) -> StateResult<ReportOutcome> {
        let mut collaborators = Collaborators {
            router: &mut self.router,
            burner: &mut self.burner,
            withdrawal_vault: &mut self.withdrawal_vault,
            el_rewards_vault: &mut self.el_rewards_vault,
            sanity_checker: &self.checker,
            rebase_receiver: Some(&mut self.receiver),
        };
        self.pool.handle_oracle_report(report, &mut collaborators)
    }

    fn share_rate(&self) -> U256 {
        self.pool
            .total_pooled_ether()
            .mul_div(share_rate_precision(), self.pool.total_shares())
            .unwrap()
    }

    fn assert_shares_conserved(&self) {
        let sum = self
            .pool
            .shares_book()
            .holders()
            .fold(U256::zero(), |acc, (_, shares)| acc + *shares);
        assert_eq!(sum, self.pool.shares_book().total_shares());
    }
}

#[test]
fn multi_report_lifecycle() {
    let mut protocol = Protocol::new();
    let alice = derive_address("alice");
    let bob = derive_address("bob");
    protocol.pool.submit(alice, ether(64)).unwrap();
    protocol.pool.submit(bob, ether(32)).unwrap();
    assert_eq!(protocol.pool.total_pooled_ether(), ether(128));

    // Three validators leave 32 ether buffered.
    assert_eq!(protocol.pool.deposit(3, 1, &mut protocol.router).unwrap(), 3);
    assert_eq!(protocol.pool.buffered_ether(), ether(32));
    assert_eq!(protocol.pool.transient_balance(), ether(96));

    // Report 1: validators appear with 0.01 ether of rewards.
    let rewards = ether(1) / u(100);
    let outcome = protocol
        .report(&OracleReport {
            report_timestamp: 86_400,
            time_elapsed: 86_400,
            cl_validators: 3,
            post_cl_balance: ether(96) + rewards,
            ..OracleReport::default()
        })
        .unwrap();
    assert_eq!(outcome.post_total_pooled_ether, ether(128) + rewards);
    assert!(!outcome.shares_minted_as_fees.is_zero());
    assert!(protocol.share_rate() > share_rate_precision());
    assert!(protocol.pool.balance_of(&alice).unwrap() > ether(64));
    protocol.assert_shares_conserved();

    // Alice asks for 10 ether back.
    let request_id = protocol
        .pool
        .request_withdrawal(alice, ether(10), 90_000)
        .unwrap();
    let requested_shares = protocol.pool.queue().get_status(request_id).unwrap().amount_of_shares;

    // Report 2: finalize everything the buffer covers.
    let report_timestamp = 2 * 86_400;
    let rate = protocol.share_rate();
    let batches = protocol
        .pool
        .queue()
        .calculate_finalization_batches(
            rate,
            report_timestamp - DEFAULT_REQUEST_TIMESTAMP_MARGIN,
            1_000,
            BatchesCalculationState::new(protocol.pool.buffered_ether()),
        )
        .unwrap();
    assert!(batches.finished);
    assert_eq!(batches.batches, vec![request_id]);

    let pre_total_pooled_ether = protocol.pool.total_pooled_ether();
    let outcome = protocol
        .report(&OracleReport {
            report_timestamp,
            time_elapsed: 86_400,
            cl_validators: 3,
            post_cl_balance: ether(96) + rewards,
            withdrawal_finalization_batches: batches.batches.clone(),
            simulated_share_rate: rate,
            ..OracleReport::default()
        })
        .unwrap();
    assert!(outcome.ether_locked <= ether(10));
    assert!(ether(10) - outcome.ether_locked < u(10));
    assert_eq!(outcome.shares_burnt, requested_shares);
    assert_eq!(
        outcome.post_total_pooled_ether,
        pre_total_pooled_ether - outcome.ether_locked
    );
    assert_eq!(protocol.burner.total_committed, requested_shares);
    assert_eq!(protocol.receiver.rebases.len(), 2);
    protocol.assert_shares_conserved();

    // Claim with a looked-up hint.
    let queue = protocol.pool.queue();
    let hint = queue
        .find_checkpoint_hint(request_id, 1, queue.last_checkpoint_index())
        .unwrap()
        .unwrap();
    let claimed = protocol
        .pool
        .claim_withdrawal(request_id, hint, alice)
        .unwrap();
    assert_eq!(claimed.amount_of_eth, outcome.ether_locked);
    assert_eq!(claimed.owner, alice);
    assert!(protocol.pool.queue().requests_of(&alice).is_empty());
    assert_eq!(
        protocol.pool.claim_withdrawal(request_id, hint, alice),
        Err(StateError::RequestAlreadyClaimed { request_id })
    );

    // Bunker mode halts deposits.
    protocol.pool.set_bunker_mode(true);
    assert_eq!(
        protocol.pool.deposit(1, 1, &mut protocol.router),
        Err(StateError::CannotDeposit)
    );
}

#[test]
fn failed_report_leaves_no_trace() {
    let mut protocol = Protocol::new();
    protocol.pool.submit(derive_address("alice"), ether(32)).unwrap();
    protocol.pool.deposit(2, 1, &mut protocol.router).unwrap();
    protocol.el_rewards_vault.fund(ether(1));
    let before = protocol.pool.snapshot_bytes().unwrap();

    let result = protocol.report(&OracleReport {
        report_timestamp: 86_400,
        time_elapsed: 86_400,
        cl_validators: 5,
        post_cl_balance: ether(160),
        el_rewards_vault_balance: ether(1),
        ..OracleReport::default()
    });
    assert_eq!(
        result,
        Err(StateError::ReportedMoreDepositedThanExists {
            reported: 5,
            deposited: 2
        })
    );
    assert_eq!(protocol.pool.snapshot_bytes().unwrap(), before);
    assert_eq!(Pool::from_snapshot_bytes(&before).unwrap(), protocol.pool);
    assert!(protocol.receiver.rebases.is_empty());
    assert!(protocol.router.minted_rewards.is_empty());
    assert!(protocol.el_rewards_vault.total_withdrawn().is_zero());
}
