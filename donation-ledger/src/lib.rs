//! Donation Ledger
//!
//! Persistent donation ledger with a reward engine: donors send value to a
//! custody account, every donation is recorded under a dense sequence id and
//! rewarded 1:1 with reward tokens, and donors whose cumulative giving
//! reaches ten times the minimum may claim a one-time 10% bonus.
//!
//! # Architecture
//!
//! - **Single Writer**: One actor task owns the engine and serializes every call
//! - **Draft then Commit**: Validation and external calls run against a staged
//!   draft; state changes land in one atomic write batch
//! - **Pluggable Collaborators**: Value transfer and reward issuance sit behind
//!   traits so the engine never knows which asset or token backs it
//!
//! # Invariants
//!
//! - Lifetime total equals the sum of every recorded donation
//! - A donor's total and count match their indexed history
//! - Sequence ids are dense from zero and never reused
//! - The bonus is issued at most once per donor

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod actor;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod integration;
pub mod ledger;
pub mod metrics;
pub mod state;
pub mod storage;
pub mod streak;
pub mod types;

// Re-exports
pub use config::Config;
pub use engine::DonationEngine;
pub use error::{Error, Result};
pub use ledger::DonationLedger;
pub use storage::{MemoryStore, RocksStore, Store};
pub use types::{
    Address, Amount, CallContext, DonationEntry, DonorRecord, Purpose, SequenceId, Statistics,
};
