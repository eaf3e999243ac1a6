use super::DonationEngine;
use crate::integration::{RewardIssuer, ValueTransfer};
use crate::storage::Store;
use crate::types::{Address, Amount, DonationEntry, DonorRecord, SequenceId, Statistics};
use crate::{Error, Result};

impl<S, T, R> DonationEngine<S, T, R>
where
    S: Store,
    T: ValueTransfer,
    R: RewardIssuer,
{
    /// Donor record
    pub fn get_donor(&self, address: &Address) -> Result<DonorRecord> {
        self.state
            .donor(address)?
            .ok_or_else(|| Error::RecordNotFound(format!("donor {}", address)))
    }

    /// Donation entry by sequence id
    pub fn get_donation(&self, sequence_id: SequenceId) -> Result<DonationEntry> {
        self.state
            .donation(sequence_id)?
            .ok_or_else(|| Error::RecordNotFound(format!("donation {}", sequence_id)))
    }

    /// Aggregate counters (always succeeds)
    pub fn get_statistics(&self) -> Statistics {
        self.state.global().statistics()
    }

    /// Ledger owner
    pub fn owner(&self) -> &Address {
        &self.state.global().owner
    }

    /// A donor's history in sequence order; empty for unknown addresses
    pub fn get_donor_donations(&self, address: &Address) -> Result<Vec<DonationEntry>> {
        self.state
            .donor_donation_ids(address)?
            .into_iter()
            .map(|id| self.get_donation(id))
            .collect()
    }

    /// Recompute a donor's totals from history and compare with the record
    pub fn audit_donor(&self, address: &Address) -> Result<DonorRecord> {
        let record = self.get_donor(address)?;
        let history = self.get_donor_donations(address)?;

        let mut total = Amount::ZERO;
        for entry in &history {
            if &entry.donor != address {
                return Err(Error::InvariantViolation(format!(
                    "donation {} indexed under {} belongs to {}",
                    entry.sequence_id, address, entry.donor
                )));
            }
            total = total
                .checked_add(entry.amount)
                .ok_or(Error::ArithmeticOverflow("history total"))?;
        }

        if total != record.total_donated || history.len() as u64 != record.donation_count {
            return Err(Error::InvariantViolation(format!(
                "donor {} record shows {} over {} donations, history shows {} over {}",
                address,
                record.total_donated,
                record.donation_count,
                total,
                history.len()
            )));
        }

        Ok(record)
    }
}
