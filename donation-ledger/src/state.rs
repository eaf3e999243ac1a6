//! Ledger state aggregate and staged drafts
//!
//! `LedgerState` is the single owner of global counters. Every mutating
//! operation works on a [`Draft`]; nothing becomes visible to readers until
//! the draft is committed, so an operation that fails halfway leaves no trace.

use crate::storage::Store;
use crate::types::{Address, Amount, DonationEntry, DonorRecord, GlobalState, SequenceId};
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Staged mutations for one operation
#[derive(Debug, Clone)]
pub struct Draft {
    global: GlobalState,
    donors: BTreeMap<Address, DonorRecord>,
    donations: Vec<DonationEntry>,
}

impl Draft {
    /// Start a draft from the current global state
    pub fn new(global: GlobalState) -> Self {
        Self {
            global,
            donors: BTreeMap::new(),
            donations: Vec::new(),
        }
    }

    /// Staged global state
    pub fn global(&self) -> &GlobalState {
        &self.global
    }

    /// Mutable staged global state
    pub fn global_mut(&mut self) -> &mut GlobalState {
        &mut self.global
    }

    /// Stage a donor record write
    pub fn put_donor(&mut self, address: Address, record: DonorRecord) {
        self.donors.insert(address, record);
    }

    /// Stage a history append
    pub fn append_donation(&mut self, entry: DonationEntry) {
        self.donations.push(entry);
    }

    /// Staged donor writes
    pub fn donors(&self) -> impl Iterator<Item = (&Address, &DonorRecord)> {
        self.donors.iter()
    }

    /// Staged history appends
    pub fn donations(&self) -> &[DonationEntry] {
        &self.donations
    }
}

/// Global state plus the store it persists to
pub struct LedgerState<S> {
    store: S,
    global: GlobalState,
}

impl<S: Store> LedgerState<S> {
    /// Load existing state, or write genesis if the store is empty
    ///
    /// An existing ledger must have been created for the same owner.
    pub fn open(store: S, owner: Address, initial_minimum: Amount) -> Result<Self> {
        if let Some(global) = store.load_global()? {
            if global.owner != owner {
                return Err(Error::Config(format!(
                    "Ledger owner is {}, configuration names {}",
                    global.owner, owner
                )));
            }
            tracing::info!(
                owner = %global.owner,
                next_sequence = global.next_sequence,
                "Loaded existing ledger state"
            );
            return Ok(Self { store, global });
        }

        if initial_minimum.is_zero() {
            return Err(Error::Config("Initial minimum donation must be positive".to_string()));
        }

        let global = GlobalState::genesis(owner, initial_minimum);
        store.commit(&Draft::new(global.clone()))?;
        tracing::info!(
            owner = %global.owner,
            minimum = %initial_minimum,
            "Initialized genesis state"
        );

        Ok(Self { store, global })
    }

    /// Committed global state
    pub fn global(&self) -> &GlobalState {
        &self.global
    }

    /// Donor record if the address ever donated
    pub fn donor(&self, address: &Address) -> Result<Option<DonorRecord>> {
        self.store.get_donor(address)
    }

    /// Donor record, or the zero-value record for a new address
    pub fn donor_or_default(&self, address: &Address) -> Result<DonorRecord> {
        Ok(self.store.get_donor(address)?.unwrap_or_default())
    }

    /// History entry by sequence id
    pub fn donation(&self, sequence_id: SequenceId) -> Result<Option<DonationEntry>> {
        self.store.get_donation(sequence_id)
    }

    /// Sequence ids of a donor's history, ascending
    pub fn donor_donation_ids(&self, address: &Address) -> Result<Vec<SequenceId>> {
        self.store.donor_donation_ids(address)
    }

    /// Begin a draft over the committed global state
    pub fn begin(&self) -> Draft {
        Draft::new(self.global.clone())
    }

    /// Persist a draft and adopt its global state
    pub fn commit(&mut self, draft: Draft) -> Result<()> {
        self.store.commit(&draft)?;
        self.global = draft.global;
        Ok(())
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }
}
