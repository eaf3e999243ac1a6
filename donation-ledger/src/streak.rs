//! Donor statistics and the consecutive-activity streak
//!
//! A streak counts donations that each land within `ONE_DAY_IN_BLOCKS` of the
//! previous one. The gap is always measured against the height recorded
//! *before* the current donation is applied.

use crate::types::{Amount, BlockHeight, DonorRecord, ONE_DAY_IN_BLOCKS};
use crate::{Error, Result};

/// Streak value after a donation at `height`
///
/// A donor with no prior donation has an infinite gap. A height below the
/// recorded one saturates to a zero gap.
pub fn next_streak(previous: &DonorRecord, height: BlockHeight) -> u64 {
    if previous.is_new() {
        return 1;
    }

    let gap = height.saturating_sub(previous.last_donation_height);
    if gap < ONE_DAY_IN_BLOCKS {
        previous.streak.saturating_add(1)
    } else {
        1
    }
}

impl DonorRecord {
    /// Apply one accepted donation
    ///
    /// `bonus_claimed` is carried over unchanged.
    pub fn record_donation(&mut self, amount: Amount, height: BlockHeight) -> Result<()> {
        let total_donated = self
            .total_donated
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow("donor total"))?;
        let donation_count = self
            .donation_count
            .checked_add(1)
            .ok_or(Error::ArithmeticOverflow("donation count"))?;

        self.streak = next_streak(self, height);
        self.total_donated = total_donated;
        self.donation_count = donation_count;
        self.last_donation_height = height;
        Ok(())
    }
}
