//! Storage layer
//!
//! The `Store` trait is the only persistence capability the engine sees.
//! Writes are never issued one key at a time: an operation stages everything
//! in a [`Draft`] and the store applies it atomically.
//!
//! # Column Families (RocksDB)
//!
//! - `state` - Global state singleton (key: `global`)
//! - `donors` - Donor records (key: address)
//! - `donations` - Append-only donation history (key: sequence id, big-endian)
//! - `indices` - Per-donor history index (key: address || `|` || sequence id)

use crate::{
    error::{Error, Result},
    state::Draft,
    types::{Address, DonationEntry, DonorRecord, GlobalState, SequenceId},
    Config,
};
use parking_lot::RwLock;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Column family names
const CF_STATE: &str = "state";
const CF_DONORS: &str = "donors";
const CF_DONATIONS: &str = "donations";
const CF_INDICES: &str = "indices";

const GLOBAL_KEY: &[u8] = b"global";

/// Persistence capability used by the ledger state
pub trait Store: Send + Sync {
    /// Global state, `None` before genesis
    fn load_global(&self) -> Result<Option<GlobalState>>;

    /// Donor record, `None` if the address never donated
    fn get_donor(&self, address: &Address) -> Result<Option<DonorRecord>>;

    /// Donation entry by sequence id
    fn get_donation(&self, sequence_id: SequenceId) -> Result<Option<DonationEntry>>;

    /// Sequence ids of a donor's entries, ascending
    fn donor_donation_ids(&self, address: &Address) -> Result<Vec<SequenceId>>;

    /// Apply every staged write, or none of them
    fn commit(&self, draft: &Draft) -> Result<()>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn load_global(&self) -> Result<Option<GlobalState>> {
        (**self).load_global()
    }

    fn get_donor(&self, address: &Address) -> Result<Option<DonorRecord>> {
        (**self).get_donor(address)
    }

    fn get_donation(&self, sequence_id: SequenceId) -> Result<Option<DonationEntry>> {
        (**self).get_donation(sequence_id)
    }

    fn donor_donation_ids(&self, address: &Address) -> Result<Vec<SequenceId>> {
        (**self).donor_donation_ids(address)
    }

    fn commit(&self, draft: &Draft) -> Result<()> {
        (**self).commit(draft)
    }
}

/// RocksDB-backed store
pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_STATE, Options::default()),
            ColumnFamilyDescriptor::new(CF_DONORS, Self::cf_options_lookup()),
            ColumnFamilyDescriptor::new(CF_DONATIONS, Self::cf_options_history()),
            ColumnFamilyDescriptor::new(CF_INDICES, Self::cf_options_lookup()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened RocksDB donation store");

        Ok(Self { db })
    }

    // Column family options

    fn cf_options_history() -> Options {
        let mut opts = Options::default();
        // History is written once and rarely read
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_lookup() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    fn index_prefix(address: &Address) -> Vec<u8> {
        let mut key = address.as_str().as_bytes().to_vec();
        key.push(b'|');
        key
    }

    fn index_key(address: &Address, sequence_id: SequenceId) -> Vec<u8> {
        let mut key = Self::index_prefix(address);
        key.extend_from_slice(&sequence_id.to_be_bytes());
        key
    }

    /// Close database (graceful shutdown)
    pub fn close(self) -> Result<()> {
        drop(self.db);
        tracing::info!("RocksDB closed gracefully");
        Ok(())
    }
}

impl Store for RocksStore {
    fn load_global(&self) -> Result<Option<GlobalState>> {
        let cf = self.cf_handle(CF_STATE)?;
        match self.db.get_cf(cf, GLOBAL_KEY)? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    fn get_donor(&self, address: &Address) -> Result<Option<DonorRecord>> {
        let cf = self.cf_handle(CF_DONORS)?;
        match self.db.get_cf(cf, address.as_str().as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    fn get_donation(&self, sequence_id: SequenceId) -> Result<Option<DonationEntry>> {
        let cf = self.cf_handle(CF_DONATIONS)?;
        match self.db.get_cf(cf, sequence_id.to_be_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    fn donor_donation_ids(&self, address: &Address) -> Result<Vec<SequenceId>> {
        let cf = self.cf_handle(CF_INDICES)?;
        let prefix = Self::index_prefix(address);
        let key_len = prefix.len() + 8;

        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix.as_slice(), Direction::Forward));

        let mut ids = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(prefix.as_slice()) {
                break;
            }
            // Longer keys belong to an address that merely shares this prefix
            if key.len() != key_len {
                continue;
            }
            let mut id_bytes = [0u8; 8];
            id_bytes.copy_from_slice(&key[prefix.len()..]);
            ids.push(SequenceId::from_be_bytes(id_bytes));
        }

        ids.sort_unstable();
        Ok(ids)
    }

    fn commit(&self, draft: &Draft) -> Result<()> {
        let mut batch = WriteBatch::default();

        // 1. Global state
        let cf_state = self.cf_handle(CF_STATE)?;
        batch.put_cf(cf_state, GLOBAL_KEY, bincode::serialize(draft.global())?);

        // 2. Donor records
        let cf_donors = self.cf_handle(CF_DONORS)?;
        for (address, record) in draft.donors() {
            batch.put_cf(cf_donors, address.as_str().as_bytes(), bincode::serialize(record)?);
        }

        // 3. History entries and their index
        let cf_donations = self.cf_handle(CF_DONATIONS)?;
        let cf_indices = self.cf_handle(CF_INDICES)?;
        for entry in draft.donations() {
            batch.put_cf(
                cf_donations,
                entry.sequence_id.to_be_bytes(),
                bincode::serialize(entry)?,
            );
            batch.put_cf(cf_indices, Self::index_key(&entry.donor, entry.sequence_id), b"");
        }

        // Atomic commit
        self.db.write(batch)?;

        tracing::debug!(
            donors = draft.donors().count(),
            donations = draft.donations().len(),
            "Draft committed"
        );

        Ok(())
    }
}

/// Volatile store with the same semantics as `RocksStore`
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<MemoryTables>,
}

#[derive(Debug, Default)]
struct MemoryTables {
    global: Option<GlobalState>,
    donors: HashMap<Address, DonorRecord>,
    donations: BTreeMap<SequenceId, DonationEntry>,
    by_donor: HashMap<Address, Vec<SequenceId>>,
}

impl MemoryStore {
    /// Create empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn load_global(&self) -> Result<Option<GlobalState>> {
        Ok(self.tables.read().global.clone())
    }

    fn get_donor(&self, address: &Address) -> Result<Option<DonorRecord>> {
        Ok(self.tables.read().donors.get(address).cloned())
    }

    fn get_donation(&self, sequence_id: SequenceId) -> Result<Option<DonationEntry>> {
        Ok(self.tables.read().donations.get(&sequence_id).cloned())
    }

    fn donor_donation_ids(&self, address: &Address) -> Result<Vec<SequenceId>> {
        Ok(self
            .tables
            .read()
            .by_donor
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    fn commit(&self, draft: &Draft) -> Result<()> {
        let mut tables = self.tables.write();

        tables.global = Some(draft.global().clone());
        for (address, record) in draft.donors() {
            tables.donors.insert(address.clone(), record.clone());
        }
        for entry in draft.donations() {
            tables
                .by_donor
                .entry(entry.donor.clone())
                .or_default()
                .push(entry.sequence_id);
            tables.donations.insert(entry.sequence_id, entry.clone());
        }

        Ok(())
    }
}
