use super::DonationEngine;
use crate::integration::{RewardIssuer, ValueTransfer};
use crate::storage::Store;
use crate::types::{Amount, CallContext, DonationEntry, Purpose, SequenceId};
use crate::{Error, Result};
use tracing::{error, info};

impl<S, T, R> DonationEngine<S, T, R>
where
    S: Store,
    T: ValueTransfer,
    R: RewardIssuer,
{
    /// Accept a donation from `ctx.caller`
    ///
    /// Checks run in order: pause, zero amount, minimum, purpose length. The
    /// value transfer happens next, then the 1:1 reward mint, and the history
    /// entry, donor record and counters are committed together last.
    /// Returns the sequence id assigned to the entry.
    pub fn submit_donation(
        &mut self,
        ctx: &CallContext,
        amount: Amount,
        purpose: Option<String>,
    ) -> Result<SequenceId> {
        self.ensure_not_paused()?;

        if amount.is_zero() {
            return Err(Error::ZeroAmount);
        }

        let minimum = self.state.global().minimum_donation;
        if amount < minimum {
            return Err(Error::AmountBelowMinimum { amount, minimum });
        }

        let purpose = purpose.map(Purpose::new).transpose()?;

        // Stage everything before touching external state
        let mut draft = self.state.begin();
        let mut donor = self.state.donor_or_default(&ctx.caller)?;
        let first_donation = donor.is_new();
        donor.record_donation(amount, ctx.height)?;

        let sequence_id = draft.global().next_sequence;
        {
            let global = draft.global_mut();
            global.total_lifetime_amount = global
                .total_lifetime_amount
                .checked_add(amount)
                .ok_or(Error::ArithmeticOverflow("lifetime total"))?;
            global.next_sequence = sequence_id
                .checked_add(1)
                .ok_or(Error::ArithmeticOverflow("sequence"))?;
            if first_donation {
                global.total_unique_donors = global
                    .total_unique_donors
                    .checked_add(1)
                    .ok_or(Error::ArithmeticOverflow("unique donors"))?;
            }
        }

        let streak = donor.streak;
        draft.put_donor(ctx.caller.clone(), donor);
        draft.append_donation(DonationEntry {
            donor: ctx.caller.clone(),
            amount,
            height: ctx.height,
            sequence_id,
            reward_token_id: sequence_id,
            purpose,
        });

        self.transfer.transfer(amount, &ctx.caller, &self.custody)?;

        if let Err(mint_error) = self.issuer.mint(amount, &ctx.caller) {
            self.refund(ctx, amount);
            return Err(mint_error.into());
        }

        if let Err(e) = self.state.commit(draft) {
            error!(
                donor = %ctx.caller,
                %amount,
                sequence_id,
                error = %e,
                "Donation settled and rewarded but not recorded"
            );
            return Err(e);
        }

        info!(
            donor = %ctx.caller,
            %amount,
            units = %amount.to_units(),
            sequence_id,
            height = ctx.height,
            streak,
            first_donation,
            "Donation accepted"
        );

        Ok(sequence_id)
    }

    /// Return value to a donor whose reward could not be minted
    fn refund(&self, ctx: &CallContext, amount: Amount) {
        match self.transfer.transfer(amount, &self.custody, &ctx.caller) {
            Ok(()) => info!(donor = %ctx.caller, %amount, "Donation refunded after failed mint"),
            Err(e) => error!(
                donor = %ctx.caller,
                %amount,
                error = %e,
                "Refund after failed mint did not settle; value remains in custody"
            ),
        }
    }
}
