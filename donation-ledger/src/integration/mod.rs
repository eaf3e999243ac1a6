//! External collaborators: value transfer and reward issuance
//!
//! Both are atomic from the engine's point of view: a call either fully
//! succeeds or returns an error with no partial effect.

pub mod memory;

use crate::types::{Address, Amount};
use std::sync::Arc;
use thiserror::Error;

pub use memory::{InMemoryBank, InMemoryRewardToken};

/// Value transfer failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Sender cannot cover the amount
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Requested amount
        required: Amount,
        /// Sender balance
        available: Amount,
    },

    /// Sender account is frozen
    #[error("account {0} is frozen")]
    Frozen(String),

    /// Any other rejection
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// Reward mint failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MintError {
    /// Issuer cannot mint right now
    #[error("reward issuer unavailable: {0}")]
    Unavailable(String),

    /// Mint would exceed the supply cap
    #[error("supply cap exceeded: requested {requested}, remaining {remaining}")]
    SupplyCapExceeded {
        /// Requested amount
        requested: Amount,
        /// Remaining mintable supply
        remaining: Amount,
    },
}

/// Moves value between accounts
pub trait ValueTransfer: Send + Sync {
    /// Move `amount` from `from` to `to`
    fn transfer(&self, amount: Amount, from: &Address, to: &Address) -> Result<(), TransferError>;
}

/// Issues fungible reward credits
pub trait RewardIssuer: Send + Sync {
    /// Credit `amount` reward units to `to`
    fn mint(&self, amount: Amount, to: &Address) -> Result<(), MintError>;
}

impl<T: ValueTransfer + ?Sized> ValueTransfer for Arc<T> {
    fn transfer(&self, amount: Amount, from: &Address, to: &Address) -> Result<(), TransferError> {
        (**self).transfer(amount, from, to)
    }
}

impl<T: RewardIssuer + ?Sized> RewardIssuer for Arc<T> {
    fn mint(&self, amount: Amount, to: &Address) -> Result<(), MintError> {
        (**self).mint(amount, to)
    }
}
