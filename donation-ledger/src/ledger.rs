//! Main ledger orchestration layer
//!
//! This module ties together storage, the engine and the actor into a
//! high-level async API.
//!
//! # Example
//!
//! ```no_run
//! use donation_ledger::clock::WallClockHeight;
//! use donation_ledger::integration::{InMemoryBank, InMemoryRewardToken};
//! use donation_ledger::types::{Address, Amount};
//! use donation_ledger::{Config, DonationLedger};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> donation_ledger::Result<()> {
//!     let config = Config::default();
//!     let heights = WallClockHeight::from_config(&config.clock)?;
//!     let ledger = DonationLedger::open(
//!         config,
//!         Arc::new(InMemoryBank::new()),
//!         Arc::new(InMemoryRewardToken::new()),
//!         heights,
//!     )
//!     .await?;
//!
//!     let donor = Address::new("SP-DONOR");
//!     let sequence_id = ledger
//!         .submit_donation(&donor, Amount::new(1_000_000), Some("school".to_string()))
//!         .await?;
//!     println!("recorded donation {}", sequence_id);
//!
//!     ledger.shutdown().await
//! }
//! ```

use crate::{
    actor::{spawn_ledger_actor, LedgerHandle},
    clock::HeightSource,
    engine::DonationEngine,
    integration::{RewardIssuer, ValueTransfer},
    metrics::Metrics,
    state::LedgerState,
    storage::{RocksStore, Store},
    types::{Address, Amount, DonationEntry, DonorRecord, SequenceId, Statistics},
    Config, Error, Result,
};
use std::sync::Arc;

/// Main ledger interface
pub struct DonationLedger {
    /// Actor handle for async operations
    handle: LedgerHandle,

    /// Shared with the actor
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl DonationLedger {
    /// Open a RocksDB-backed ledger under `config.data_dir`
    pub async fn open<T, R, H>(config: Config, transfer: T, issuer: R, heights: H) -> Result<Self>
    where
        T: ValueTransfer + 'static,
        R: RewardIssuer + 'static,
        H: HeightSource + 'static,
    {
        config.validate()?;
        let store = RocksStore::open(&config)?;
        Self::with_store(store, config, transfer, issuer, heights).await
    }

    /// Open a ledger over any store
    pub async fn with_store<S, T, R, H>(
        store: S,
        config: Config,
        transfer: T,
        issuer: R,
        heights: H,
    ) -> Result<Self>
    where
        S: Store + 'static,
        T: ValueTransfer + 'static,
        R: RewardIssuer + 'static,
        H: HeightSource + 'static,
    {
        let state = LedgerState::open(
            store,
            config.ledger.owner(),
            config.ledger.initial_minimum(),
        )?;
        let engine = DonationEngine::new(state, transfer, issuer, config.ledger.custody());

        let metrics = Metrics::new()
            .map_err(|e| Error::Config(format!("Failed to register metrics: {}", e)))?;

        let handle = spawn_ledger_actor(
            engine,
            Arc::new(heights),
            metrics.clone(),
            config.actor.mailbox_capacity,
        );

        tracing::info!(
            service = %config.service_name,
            version = %config.service_version,
            owner = %config.ledger.owner,
            custody = %config.ledger.custody_address,
            "Donation ledger opened"
        );

        Ok(Self {
            handle,
            metrics,
            config,
        })
    }

    /// Record a donation from `caller`; returns its sequence id
    pub async fn submit_donation(
        &self,
        caller: &Address,
        amount: Amount,
        purpose: Option<String>,
    ) -> Result<SequenceId> {
        self.handle
            .submit_donation(caller.clone(), amount, purpose)
            .await
    }

    /// Claim the one-time bonus; returns the amount issued
    pub async fn claim_bonus(&self, caller: &Address) -> Result<Amount> {
        self.handle.claim_bonus(caller.clone()).await
    }

    /// Replace the minimum donation (owner only)
    pub async fn set_minimum_donation(&self, caller: &Address, amount: Amount) -> Result<()> {
        self.handle.set_minimum_donation(caller.clone(), amount).await
    }

    /// Flip the pause flag (owner only); returns the new value
    pub async fn toggle_pause(&self, caller: &Address) -> Result<bool> {
        self.handle.toggle_pause(caller.clone()).await
    }

    /// Move custodial funds to the owner (owner only)
    pub async fn withdraw(&self, caller: &Address, amount: Amount) -> Result<()> {
        self.handle.withdraw(caller.clone(), amount).await
    }

    /// Get donor record
    pub async fn get_donor(&self, address: &Address) -> Result<DonorRecord> {
        self.handle.get_donor(address.clone()).await
    }

    /// Get donation entry
    pub async fn get_donation(&self, sequence_id: SequenceId) -> Result<DonationEntry> {
        self.handle.get_donation(sequence_id).await
    }

    /// Get a donor's history in sequence order
    pub async fn get_donor_donations(&self, address: &Address) -> Result<Vec<DonationEntry>> {
        self.handle.get_donor_donations(address.clone()).await
    }

    /// Check a donor's record against their history
    pub async fn audit_donor(&self, address: &Address) -> Result<DonorRecord> {
        self.handle.audit_donor(address.clone()).await
    }

    /// Get aggregate counters
    pub async fn get_statistics(&self) -> Result<Statistics> {
        self.handle.get_statistics().await
    }

    /// Ledger owner
    pub async fn owner(&self) -> Result<Address> {
        self.handle.owner().await
    }

    /// Metrics shared with the actor
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Configuration the ledger was opened with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shutdown ledger
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }
}
