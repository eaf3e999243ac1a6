//! Core types for the donation ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact integer arithmetic on micro-units
//! - Cheap copies for the hot donation path

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Blocks per day at a 10 minute block interval
pub const ONE_DAY_IN_BLOCKS: u64 = 144;

/// Bonus threshold as a multiple of the minimum donation
pub const THRESHOLD_MULTIPLIER: u64 = 10;

/// Bonus credit is `total_donated / BONUS_RATE`
pub const BONUS_RATE: u64 = 10;

/// Default minimum donation (1 whole unit)
pub const DEFAULT_MINIMUM_DONATION: u64 = 1_000_000;

/// Maximum purpose label length, in characters
pub const MAX_PURPOSE_LENGTH: usize = 64;

/// Micro-units per whole unit
pub const MICRO_PER_UNIT: u64 = 1_000_000;

/// Chain height used for streak computation
pub type BlockHeight = u64;

/// Dense donation identifier, starting at 0
pub type SequenceId = u64;

/// Principal identifier (donor, owner, custody account)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Create new address
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Value in micro-units
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(u64);

impl Amount {
    /// Zero
    pub const ZERO: Amount = Amount(0);

    /// Create from micro-units
    pub const fn new(micro: u64) -> Self {
        Self(micro)
    }

    /// Raw micro-units
    pub const fn micro(self) -> u64 {
        self.0
    }

    /// True when zero
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Multiplication by a scalar, clamped at `u64::MAX`
    pub fn saturating_mul(self, factor: u64) -> Amount {
        Amount(self.0.saturating_mul(factor))
    }

    /// Integer division by a scalar (floor)
    pub fn div_floor(self, divisor: u64) -> Amount {
        Amount(self.0 / divisor)
    }

    /// Whole units as an exact decimal
    pub fn to_units(self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(MICRO_PER_UNIT)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free-form donation category, bounded to `MAX_PURPOSE_LENGTH` characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purpose(String);

impl Purpose {
    /// Validate and wrap a label
    pub fn new(label: impl Into<String>) -> crate::Result<Self> {
        let label = label.into();
        let length = label.chars().count();
        if length > MAX_PURPOSE_LENGTH {
            return Err(crate::Error::InvalidPurpose {
                length,
                max: MAX_PURPOSE_LENGTH,
            });
        }
        Ok(Self(label))
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Caller identity and chain height for one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    /// Principal invoking the operation
    pub caller: Address,

    /// Height at which the operation executes
    pub height: BlockHeight,
}

impl CallContext {
    /// Create new context
    pub fn new(caller: Address, height: BlockHeight) -> Self {
        Self { caller, height }
    }
}

/// Process-wide counters and configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalState {
    /// Owner fixed at genesis
    pub owner: Address,

    /// Current floor for accepted donations
    pub minimum_donation: Amount,

    /// Sum of all accepted donations (never decreases)
    pub total_lifetime_amount: Amount,

    /// Distinct donors ever recorded
    pub total_unique_donors: u64,

    /// Rejects donations and claims while set
    pub system_paused: bool,

    /// Identifier for the next donation entry
    pub next_sequence: SequenceId,
}

impl GlobalState {
    /// Initial state for a fresh ledger
    pub fn genesis(owner: Address, minimum_donation: Amount) -> Self {
        Self {
            owner,
            minimum_donation,
            total_lifetime_amount: Amount::ZERO,
            total_unique_donors: 0,
            system_paused: false,
            next_sequence: 0,
        }
    }

    /// Cumulative total a donor needs before claiming the bonus
    ///
    /// Clamped at `u64::MAX`; a donor total can never exceed that anyway.
    pub fn bonus_threshold(&self) -> Amount {
        self.minimum_donation.saturating_mul(THRESHOLD_MULTIPLIER)
    }

    /// Read-only projection
    pub fn statistics(&self) -> Statistics {
        Statistics {
            total_lifetime_amount: self.total_lifetime_amount,
            total_unique_donors: self.total_unique_donors,
            minimum_donation: self.minimum_donation,
            system_paused: self.system_paused,
            next_sequence: self.next_sequence,
        }
    }
}

/// Aggregate counters returned by `get_statistics`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Sum of all accepted donations
    pub total_lifetime_amount: Amount,
    /// Distinct donors
    pub total_unique_donors: u64,
    /// Current minimum donation
    pub minimum_donation: Amount,
    /// Pause flag
    pub system_paused: bool,
    /// Next sequence id (equals number of donations)
    pub next_sequence: SequenceId,
}

/// Per-donor aggregate, created on first donation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorRecord {
    /// Sum of this donor's entries
    pub total_donated: Amount,

    /// Number of this donor's entries
    pub donation_count: u64,

    /// Height of the most recent donation
    pub last_donation_height: BlockHeight,

    /// One-time bonus issued (never reset)
    pub bonus_claimed: bool,

    /// Consecutive donations each within a day of the previous one
    pub streak: u64,
}

impl DonorRecord {
    /// True for the zero-value record of an address that never donated
    pub fn is_new(&self) -> bool {
        self.donation_count == 0
    }
}

/// Immutable history entry, keyed by sequence id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationEntry {
    /// Donor address
    pub donor: Address,

    /// Donated amount
    pub amount: Amount,

    /// Height at which the donation was accepted
    pub height: BlockHeight,

    /// Entry key
    pub sequence_id: SequenceId,

    /// Reward token identifier (same value as `sequence_id`)
    pub reward_token_id: SequenceId,

    /// Optional category label
    pub purpose: Option<Purpose>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purpose_length_bound() {
        assert!(Purpose::new("education").is_ok());
        assert!(Purpose::new("x".repeat(MAX_PURPOSE_LENGTH)).is_ok());

        let err = Purpose::new("x".repeat(MAX_PURPOSE_LENGTH + 1)).unwrap_err();
        assert!(matches!(err, crate::Error::InvalidPurpose { length: 65, max: 64 }));
    }

    #[test]
    fn test_purpose_counts_characters_not_bytes() {
        // 64 two-byte characters
        let label = "é".repeat(MAX_PURPOSE_LENGTH);
        assert_eq!(label.len(), 128);
        assert!(Purpose::new(label).is_ok());
    }

    #[test]
    fn test_amount_to_units() {
        assert_eq!(Amount::new(1_500_000).to_units(), Decimal::new(15, 1));
        assert_eq!(Amount::ZERO.to_units(), Decimal::ZERO);
    }

    #[test]
    fn test_amount_arithmetic() {
        assert_eq!(
            Amount::new(10_000_000).div_floor(BONUS_RATE),
            Amount::new(1_000_000)
        );
        assert_eq!(Amount::new(19).div_floor(BONUS_RATE), Amount::new(1));
        assert!(Amount::new(u64::MAX).checked_add(Amount::new(1)).is_none());
    }

    #[test]
    fn test_bonus_threshold() {
        let global = GlobalState::genesis(Address::new("SP-OWNER"), Amount::new(1_000_000));
        assert_eq!(global.bonus_threshold(), Amount::new(10_000_000));

        let global = GlobalState::genesis(Address::new("SP-OWNER"), Amount::new(u64::MAX / 5));
        assert_eq!(global.bonus_threshold(), Amount::new(u64::MAX));
    }

    #[test]
    fn test_genesis_statistics() {
        let stats = GlobalState::genesis(Address::new("SP-OWNER"), Amount::new(5)).statistics();
        assert_eq!(stats.total_lifetime_amount, Amount::ZERO);
        assert_eq!(stats.total_unique_donors, 0);
        assert_eq!(stats.minimum_donation, Amount::new(5));
        assert!(!stats.system_paused);
        assert_eq!(stats.next_sequence, 0);
    }
}
