//! Actor-based serialization for the ledger
//!
//! Every operation, read or write, goes through one task that owns the
//! engine. Streak computation and the first-donor check read state that a
//! concurrent donation could otherwise change underneath them; a single
//! writer makes each call one indivisible step.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │   height = HeightSource::current_height()            │
//! │   DonationEngine::{submit_donation, claim_bonus, ..} │
//! │                       │                               │
//! │                       ▼                               │
//! │               Store::commit(draft)                    │
//! │          (atomic write to RocksDB)                    │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::clock::HeightSource;
use crate::engine::DonationEngine;
use crate::integration::{RewardIssuer, ValueTransfer};
use crate::metrics::Metrics;
use crate::storage::Store;
use crate::types::{
    Address, Amount, CallContext, DonationEntry, DonorRecord, SequenceId, Statistics,
};
use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the ledger actor
pub enum LedgerMessage {
    /// Submit a donation
    SubmitDonation {
        /// Invoking principal
        caller: Address,
        /// Amount in micro-units
        amount: Amount,
        /// Optional category label
        purpose: Option<String>,
        /// Reply channel
        response: oneshot::Sender<Result<SequenceId>>,
    },

    /// Claim the one-time bonus
    ClaimBonus {
        /// Invoking principal
        caller: Address,
        /// Reply channel
        response: oneshot::Sender<Result<Amount>>,
    },

    /// Replace the minimum donation
    SetMinimumDonation {
        /// Invoking principal
        caller: Address,
        /// Amount in micro-units
        amount: Amount,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Flip the pause flag
    TogglePause {
        /// Invoking principal
        caller: Address,
        /// Reply channel
        response: oneshot::Sender<Result<bool>>,
    },

    /// Withdraw custodial funds
    Withdraw {
        /// Invoking principal
        caller: Address,
        /// Amount in micro-units
        amount: Amount,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Get donor record
    GetDonor {
        /// Donor address
        address: Address,
        /// Reply channel
        response: oneshot::Sender<Result<DonorRecord>>,
    },

    /// Get donation entry
    GetDonation {
        /// Entry key
        sequence_id: SequenceId,
        /// Reply channel
        response: oneshot::Sender<Result<DonationEntry>>,
    },

    /// Get a donor's history
    GetDonorDonations {
        /// Donor address
        address: Address,
        /// Reply channel
        response: oneshot::Sender<Result<Vec<DonationEntry>>>,
    },

    /// Recompute a donor's totals from history
    AuditDonor {
        /// Donor address
        address: Address,
        /// Reply channel
        response: oneshot::Sender<Result<DonorRecord>>,
    },

    /// Get aggregate counters
    GetStatistics {
        /// Reply channel
        response: oneshot::Sender<Statistics>,
    },

    /// Get the ledger owner
    Owner {
        /// Reply channel
        response: oneshot::Sender<Address>,
    },

    /// Stop the actor after acknowledging
    Shutdown {
        /// Acknowledged once storage is released
        response: oneshot::Sender<()>,
    },
}

/// Actor that owns the engine
pub struct LedgerActor<S, T, R> {
    engine: DonationEngine<S, T, R>,
    heights: Arc<dyn HeightSource>,
    metrics: Metrics,
    mailbox: mpsc::Receiver<LedgerMessage>,
}

impl<S, T, R> LedgerActor<S, T, R>
where
    S: Store,
    T: ValueTransfer,
    R: RewardIssuer,
{
    /// Create new actor
    pub fn new(
        engine: DonationEngine<S, T, R>,
        heights: Arc<dyn HeightSource>,
        metrics: Metrics,
        mailbox: mpsc::Receiver<LedgerMessage>,
    ) -> Self {
        let unique_donors = engine.get_statistics().total_unique_donors;
        metrics.unique_donors.set(unique_donors as i64);
        Self {
            engine,
            heights,
            metrics,
            mailbox,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let mut ack = None;
        while let Some(msg) = self.mailbox.recv().await {
            if let LedgerMessage::Shutdown { response } = msg {
                ack = Some(response);
                break;
            }
            self.handle_message(msg);
        }

        // Storage must be released before the caller may reopen it
        drop(self);
        tracing::info!("Ledger actor stopped");
        if let Some(ack) = ack {
            let _ = ack.send(());
        }
    }

    fn context(&self, caller: Address) -> CallContext {
        CallContext::new(caller, self.heights.current_height())
    }

    fn observe<V>(&self, operation: &'static str, result: &Result<V>) {
        if let Err(e) = result {
            self.metrics.record_rejection(e.kind());
            tracing::warn!(operation, kind = e.kind(), error = %e, "Operation rejected");
        }
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::SubmitDonation {
                caller,
                amount,
                purpose,
                response,
            } => {
                let ctx = self.context(caller);
                let result = self.engine.submit_donation(&ctx, amount, purpose);
                self.observe("submit_donation", &result);
                if result.is_ok() {
                    let stats = self.engine.get_statistics();
                    self.metrics
                        .record_donation(amount.micro(), stats.total_unique_donors);
                }
                let _ = response.send(result);
            }

            LedgerMessage::ClaimBonus { caller, response } => {
                let ctx = self.context(caller);
                let result = self.engine.claim_bonus(&ctx);
                self.observe("claim_bonus", &result);
                if let Ok(bonus) = &result {
                    self.metrics.record_bonus(bonus.micro());
                }
                let _ = response.send(result);
            }

            LedgerMessage::SetMinimumDonation {
                caller,
                amount,
                response,
            } => {
                let ctx = self.context(caller);
                let result = self.engine.set_minimum_donation(&ctx, amount);
                self.observe("set_minimum_donation", &result);
                let _ = response.send(result);
            }

            LedgerMessage::TogglePause { caller, response } => {
                let ctx = self.context(caller);
                let result = self.engine.toggle_pause(&ctx);
                self.observe("toggle_pause", &result);
                let _ = response.send(result);
            }

            LedgerMessage::Withdraw {
                caller,
                amount,
                response,
            } => {
                let ctx = self.context(caller);
                let result = self.engine.withdraw(&ctx, amount);
                self.observe("withdraw", &result);
                if result.is_ok() {
                    self.metrics.record_withdrawal();
                }
                let _ = response.send(result);
            }

            LedgerMessage::GetDonor { address, response } => {
                let _ = response.send(self.engine.get_donor(&address));
            }

            LedgerMessage::GetDonation {
                sequence_id,
                response,
            } => {
                let _ = response.send(self.engine.get_donation(sequence_id));
            }

            LedgerMessage::GetDonorDonations { address, response } => {
                let _ = response.send(self.engine.get_donor_donations(&address));
            }

            LedgerMessage::AuditDonor { address, response } => {
                let result = self.engine.audit_donor(&address);
                self.observe("audit_donor", &result);
                let _ = response.send(result);
            }

            LedgerMessage::GetStatistics { response } => {
                let _ = response.send(self.engine.get_statistics());
            }

            LedgerMessage::Owner { response } => {
                let _ = response.send(self.engine.owner().clone());
            }

            LedgerMessage::Shutdown { .. } => {
                // Handled in run loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    async fn request<V>(
        &self,
        build: impl FnOnce(oneshot::Sender<V>) -> LedgerMessage,
    ) -> Result<V> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Submit a donation
    pub async fn submit_donation(
        &self,
        caller: Address,
        amount: Amount,
        purpose: Option<String>,
    ) -> Result<SequenceId> {
        self.request(|response| LedgerMessage::SubmitDonation {
            caller,
            amount,
            purpose,
            response,
        })
        .await?
    }

    /// Claim the one-time bonus
    pub async fn claim_bonus(&self, caller: Address) -> Result<Amount> {
        self.request(|response| LedgerMessage::ClaimBonus { caller, response })
            .await?
    }

    /// Replace the minimum donation
    pub async fn set_minimum_donation(&self, caller: Address, amount: Amount) -> Result<()> {
        self.request(|response| LedgerMessage::SetMinimumDonation {
            caller,
            amount,
            response,
        })
        .await?
    }

    /// Flip the pause flag
    pub async fn toggle_pause(&self, caller: Address) -> Result<bool> {
        self.request(|response| LedgerMessage::TogglePause { caller, response })
            .await?
    }

    /// Withdraw custodial funds
    pub async fn withdraw(&self, caller: Address, amount: Amount) -> Result<()> {
        self.request(|response| LedgerMessage::Withdraw {
            caller,
            amount,
            response,
        })
        .await?
    }

    /// Get donor record
    pub async fn get_donor(&self, address: Address) -> Result<DonorRecord> {
        self.request(|response| LedgerMessage::GetDonor { address, response })
            .await?
    }

    /// Get donation entry
    pub async fn get_donation(&self, sequence_id: SequenceId) -> Result<DonationEntry> {
        self.request(|response| LedgerMessage::GetDonation {
            sequence_id,
            response,
        })
        .await?
    }

    /// Get a donor's history
    pub async fn get_donor_donations(&self, address: Address) -> Result<Vec<DonationEntry>> {
        self.request(|response| LedgerMessage::GetDonorDonations { address, response })
            .await?
    }

    /// Recompute a donor's totals from history
    pub async fn audit_donor(&self, address: Address) -> Result<DonorRecord> {
        self.request(|response| LedgerMessage::AuditDonor { address, response })
            .await?
    }

    /// Get aggregate counters
    pub async fn get_statistics(&self) -> Result<Statistics> {
        self.request(|response| LedgerMessage::GetStatistics { response })
            .await
    }

    /// Get the ledger owner
    pub async fn owner(&self) -> Result<Address> {
        self.request(|response| LedgerMessage::Owner { response })
            .await
    }

    /// Shutdown actor and wait for it to stop
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|response| LedgerMessage::Shutdown { response })
            .await
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor<S, T, R>(
    engine: DonationEngine<S, T, R>,
    heights: Arc<dyn HeightSource>,
    metrics: Metrics,
    mailbox_capacity: usize,
) -> LedgerHandle
where
    S: Store + 'static,
    T: ValueTransfer + 'static,
    R: RewardIssuer + 'static,
{
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let actor = LedgerActor::new(engine, heights, metrics, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}
