//! Error types for the donation ledger

use crate::integration::{MintError, TransferError};
use crate::types::Amount;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
///
/// Every public operation returns exactly one of these on failure. Validation
/// kinds are produced before any external effect and leave state untouched.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller is not the ledger owner
    #[error("Caller {0} is not the ledger owner")]
    NotOwner(String),

    /// Amount must be greater than zero
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// Donation below the current minimum
    #[error("Donation of {amount} is below the minimum of {minimum}")]
    AmountBelowMinimum {
        /// Submitted amount
        amount: Amount,
        /// Minimum in force at submission
        minimum: Amount,
    },

    /// Purpose label exceeds the length bound
    #[error("Purpose is {length} characters, maximum is {max}")]
    InvalidPurpose {
        /// Length of the rejected label
        length: usize,
        /// Maximum accepted length
        max: usize,
    },

    /// Donations and claims are paused
    #[error("System is paused")]
    SystemPaused,

    /// Value transfer collaborator rejected the movement
    #[error("Value transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    /// Reward issuer rejected the mint
    #[error("Reward mint failed: {0}")]
    RewardMintFailed(#[from] MintError),

    /// Donor has not reached the bonus threshold
    #[error("Cumulative donations {total} below bonus threshold {threshold}")]
    InsufficientCumulativeDonations {
        /// Donor's cumulative total
        total: Amount,
        /// Threshold in force at claim time
        threshold: Amount,
    },

    /// Bonus already issued to this donor
    #[error("Bonus already claimed by {0}")]
    AlreadyClaimed(String),

    /// Requested record does not exist
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Invariant violation (donor totals vs history, etc.)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Counter or balance overflow
    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(&'static str),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable label for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotOwner(_) => "not_owner",
            Error::ZeroAmount => "zero_amount",
            Error::AmountBelowMinimum { .. } => "amount_below_minimum",
            Error::InvalidPurpose { .. } => "invalid_purpose",
            Error::SystemPaused => "system_paused",
            Error::TransferFailed(_) => "transfer_failed",
            Error::RewardMintFailed(_) => "reward_mint_failed",
            Error::InsufficientCumulativeDonations { .. } => "insufficient_cumulative_donations",
            Error::AlreadyClaimed(_) => "already_claimed",
            Error::RecordNotFound(_) => "record_not_found",
            Error::Storage(_) => "storage",
            Error::Serialization(_) => "serialization",
            Error::InvariantViolation(_) => "invariant_violation",
            Error::ArithmeticOverflow(_) => "arithmetic_overflow",
            Error::Concurrency(_) => "concurrency",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
        }
    }
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
