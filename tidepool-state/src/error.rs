//! Error types for state machine operations.

use thiserror::Error;
use tidepool_core::{Address, SerializationError, U256};

/// All validation and execution errors of the accounting core.
///
/// Every fallible operation either applies all of its mutations or
/// returns one of these and applies none.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StateError {
    // === Ledger Errors ===
    /// Account holds fewer shares than the operation needs.
    #[error("insufficient shares for {account}: have {available}, need {required}")]
    InsufficientShares {
        account: Address,
        available: U256,
        required: U256,
    },
    /// Spender's allowance from the owner is below the amount spent.
    #[error("allowance of {spender} from {owner} is {allowance}, need {required}")]
    AllowanceExceeded {
        owner: Address,
        spender: Address,
        allowance: U256,
        required: U256,
    },
    /// A 256-bit computation overflowed.
    #[error("arithmetic overflow in {context}")]
    ArithmeticOverflow { context: &'static str },
    /// A rate or fee computation had a zero denominator.
    #[error("division by zero in {context}")]
    DivisionByZero { context: &'static str },
    /// Buffered ether cannot cover the requested outflow.
    #[error("insufficient buffered ether: have {available}, need {required}")]
    InsufficientBufferedEther { available: U256, required: U256 },

    // === Report Validation Errors ===
    /// More validators reported than were ever deposited.
    #[error("reported {reported} validators but only {deposited} were deposited")]
    ReportedMoreDepositedThanExists { reported: u64, deposited: u64 },
    /// Reported validator count went down.
    #[error("reported {reported} validators, fewer than the tracked {previous}")]
    ReportedValidatorCountDecreased { reported: u64, previous: u64 },
    /// Rebase limit of zero.
    #[error("invalid rebase limit {limit}")]
    InvalidRebaseLimit { limit: u64 },
    /// Tracked pooled ether would go negative.
    #[error("cannot decrease pooled ether {current} by {amount}")]
    NegativeTotalPooledEther { current: U256, amount: U256 },
    /// Distribution recipients and fees are not parallel.
    #[error("distribution has {recipients} recipients but {fees} fees")]
    WrongRecipientsInput { recipients: usize, fees: usize },
    /// Distribution module ids and recipients are not parallel.
    #[error("distribution has {module_ids} module ids but {recipients} recipients")]
    WrongModuleIdsInput { module_ids: usize, recipients: usize },
    /// Distribution fees sum to more than their precision base.
    #[error("total fee {total_fee} exceeds precision {precision}")]
    TotalFeeExceedsPrecision { total_fee: U256, precision: U256 },
    /// A vault holds less than the report claims.
    #[error("{vault} vault holds {balance}, report claims {reported}")]
    VaultBalanceTooLow {
        vault: &'static str,
        balance: U256,
        reported: U256,
    },
    /// The report-sanity policy rejected the report.
    #[error("sanity check {check} failed: {reason}")]
    SanityCheckFailed { check: &'static str, reason: String },
    /// Configuration is inconsistent.
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    // === Withdrawal Queue Errors ===
    /// Request id is zero or past the last request.
    #[error("invalid request id {request_id}")]
    InvalidRequestId { request_id: u64 },
    /// Checkpoint search window is out of range.
    #[error("invalid checkpoint range [{start}, {end}]")]
    InvalidRequestIdRange { start: u64, end: u64 },
    /// Request is past the finalized prefix.
    #[error("request {request_id} not found or not finalized")]
    RequestNotFoundOrNotFinalized { request_id: u64 },
    /// Request was already claimed.
    #[error("request {request_id} already claimed")]
    RequestAlreadyClaimed { request_id: u64 },
    /// Checkpoint hint does not price the request.
    #[error("invalid hint {hint} for request {request_id}")]
    InvalidHint { request_id: u64, hint: u64 },
    /// No batches supplied.
    #[error("empty finalization batches")]
    EmptyBatches,
    /// Batch ends are not strictly increasing or out of range.
    #[error("batch end {request_id} out of order (previous {previous})")]
    BatchesNotIncreasing { request_id: u64, previous: u64 },
    /// Share rate of zero.
    #[error("zero share rate")]
    ZeroShareRate,
    /// Finalization offered more ether than the requests are worth.
    #[error("too much ether to finalize: {amount}, owed {owed}")]
    TooMuchEtherToFinalize { amount: U256, owed: U256 },
    /// Batch calculation resumed from a finished or empty-budget state.
    #[error("invalid batches calculation state")]
    InvalidBatchesState,
    /// Withdrawal request below the minimum.
    #[error("withdrawal amount {amount} below minimum {minimum}")]
    RequestAmountTooSmall { amount: U256, minimum: U256 },
    /// Withdrawal request that locks no shares.
    #[error("withdrawal request locks zero shares")]
    ZeroSharesRequest,
    /// Withdrawal request above the maximum.
    #[error("withdrawal amount {amount} above maximum {maximum}")]
    RequestAmountTooLarge { amount: U256, maximum: U256 },

    // === Pool Lifecycle Errors ===
    /// Bootstrap attempted while shares already exist.
    #[error("pool already initialized")]
    AlreadyInitialized,
    /// Operation needs a bootstrapped pool.
    #[error("pool not initialized")]
    NotInitialized,
    /// Bootstrap with a zero balance.
    #[error("bootstrap balance must be non-zero")]
    ZeroBootstrapBalance,
    /// Submit of zero value.
    #[error("deposit value must be non-zero")]
    ZeroDeposit,
    /// Deposits are halted (bunker mode).
    #[error("cannot deposit")]
    CannotDeposit,
    /// The routing collaborator refused a deposit.
    #[error("deposit to module {module_id} rejected: {reason}")]
    DepositRejected { module_id: u64, reason: String },

    // === Snapshot Errors ===
    /// Snapshot encode/decode failed.
    #[error("snapshot error: {0}")]
    Snapshot(SerializationError),
}

impl From<SerializationError> for StateError {
    fn from(e: SerializationError) -> Self {
        StateError::Snapshot(e)
    }
}

/// Result type for state operations.
pub type StateResult<T> = Result<T, StateError>;
