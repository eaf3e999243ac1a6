//! Block height sources
//!
//! The engine never reads time itself; the actor samples a `HeightSource`
//! once per mutating call.

use crate::config::ClockConfig;
use crate::types::BlockHeight;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Current chain height
pub trait HeightSource: Send + Sync {
    /// Height for the operation about to run
    fn current_height(&self) -> BlockHeight;
}

impl<H: HeightSource + ?Sized> HeightSource for Arc<H> {
    fn current_height(&self) -> BlockHeight {
        (**self).current_height()
    }
}

/// Explicitly driven height, for tests and replay
#[derive(Debug, Default)]
pub struct ManualHeight {
    height: AtomicU64,
}

impl ManualHeight {
    /// Start at `height`
    pub fn new(height: BlockHeight) -> Self {
        Self {
            height: AtomicU64::new(height),
        }
    }

    /// Jump to `height`
    pub fn set(&self, height: BlockHeight) {
        self.height.store(height, Ordering::SeqCst);
    }

    /// Move forward by `blocks`
    pub fn advance(&self, blocks: u64) {
        self.height.fetch_add(blocks, Ordering::SeqCst);
    }
}

impl HeightSource for ManualHeight {
    fn current_height(&self) -> BlockHeight {
        self.height.load(Ordering::SeqCst)
    }
}

/// Height derived from wall-clock time since a genesis instant
#[derive(Debug, Clone)]
pub struct WallClockHeight {
    genesis: DateTime<Utc>,
    block_interval_secs: u64,
}

impl WallClockHeight {
    /// Create from genesis instant and block interval
    pub fn new(genesis: DateTime<Utc>, block_interval_secs: u64) -> Self {
        Self {
            genesis,
            block_interval_secs: block_interval_secs.max(1),
        }
    }

    /// Create from configuration
    pub fn from_config(config: &ClockConfig) -> crate::Result<Self> {
        let genesis = DateTime::from_timestamp(config.genesis_unix_secs, 0).ok_or_else(|| {
            crate::Error::Config(format!(
                "Invalid genesis timestamp {}",
                config.genesis_unix_secs
            ))
        })?;
        Ok(Self::new(genesis, config.block_interval_secs))
    }

    /// Height at an arbitrary instant (zero before genesis)
    pub fn height_at(&self, now: DateTime<Utc>) -> BlockHeight {
        let elapsed = (now - self.genesis).num_seconds();
        if elapsed <= 0 {
            return 0;
        }
        elapsed as u64 / self.block_interval_secs
    }
}

impl HeightSource for WallClockHeight {
    fn current_height(&self) -> BlockHeight {
        self.height_at(Utc::now())
    }
}
