//! Configuration for the donation ledger

use crate::types::{Address, Amount, DEFAULT_MINIMUM_DONATION};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Ownership and initial parameters
    pub ledger: LedgerConfig,

    /// Height source configuration
    pub clock: ClockConfig,

    /// RocksDB configuration
    pub rocksdb: RocksDBConfig,

    /// Actor configuration
    pub actor: ActorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/donation-ledger"),
            service_name: "donation-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            ledger: LedgerConfig::default(),
            clock: ClockConfig::default(),
            rocksdb: RocksDBConfig::default(),
            actor: ActorConfig::default(),
        }
    }
}

/// Ownership and genesis parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Owner address, fixed at genesis
    pub owner: String,

    /// Account that holds donated value
    pub custody_address: String,

    /// Minimum donation written at genesis (micro-units)
    pub initial_minimum_donation: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            owner: "SP-OWNER".to_string(),
            custody_address: "SP-CUSTODY".to_string(),
            initial_minimum_donation: DEFAULT_MINIMUM_DONATION,
        }
    }
}

impl LedgerConfig {
    /// Owner as an address
    pub fn owner(&self) -> Address {
        Address::new(self.owner.clone())
    }

    /// Custody account as an address
    pub fn custody(&self) -> Address {
        Address::new(self.custody_address.clone())
    }

    /// Genesis minimum as an amount
    pub fn initial_minimum(&self) -> Amount {
        Amount::new(self.initial_minimum_donation)
    }
}

/// Wall-clock height configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Genesis instant (Unix seconds)
    pub genesis_unix_secs: i64,

    /// Seconds per block
    pub block_interval_secs: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            genesis_unix_secs: 1_704_067_200, // 2024-01-01T00:00:00Z
            block_interval_secs: 600,         // 144 blocks per day
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 2,
            max_background_jobs: 2,
            enable_statistics: false,
        }
    }
}

/// Actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Bounded mailbox capacity (backpressure)
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("DONATION_LEDGER_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(owner) = std::env::var("DONATION_LEDGER_OWNER") {
            config.ledger.owner = owner;
        }

        if let Ok(custody) = std::env::var("DONATION_LEDGER_CUSTODY") {
            config.ledger.custody_address = custody;
        }

        if let Ok(minimum) = std::env::var("DONATION_LEDGER_MIN_DONATION") {
            config.ledger.initial_minimum_donation = minimum.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid DONATION_LEDGER_MIN_DONATION: {}", e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the ledger cannot start with
    pub fn validate(&self) -> crate::Result<()> {
        if self.ledger.owner.is_empty() || self.ledger.custody_address.is_empty() {
            return Err(crate::Error::Config(
                "Owner and custody addresses must be set".to_string(),
            ));
        }
        if self.ledger.owner == self.ledger.custody_address {
            return Err(crate::Error::Config(
                "Owner and custody must be different accounts".to_string(),
            ));
        }
        if self.ledger.initial_minimum_donation == 0 {
            return Err(crate::Error::Config(
                "Initial minimum donation must be positive".to_string(),
            ));
        }
        if self.actor.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "Mailbox capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
