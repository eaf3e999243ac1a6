use super::DonationEngine;
use crate::integration::{RewardIssuer, ValueTransfer};
use crate::storage::Store;
use crate::types::{Amount, CallContext};
use crate::{Error, Result};
use tracing::info;

impl<S, T, R> DonationEngine<S, T, R>
where
    S: Store,
    T: ValueTransfer,
    R: RewardIssuer,
{
    /// Replace the minimum donation (owner only)
    pub fn set_minimum_donation(&mut self, ctx: &CallContext, new_amount: Amount) -> Result<()> {
        self.ensure_owner(ctx)?;
        if new_amount.is_zero() {
            return Err(Error::ZeroAmount);
        }

        let previous = self.state.global().minimum_donation;
        let mut draft = self.state.begin();
        draft.global_mut().minimum_donation = new_amount;
        self.state.commit(draft)?;

        info!(%previous, minimum = %new_amount, "Minimum donation updated");
        Ok(())
    }

    /// Flip the pause flag (owner only), returning the new value
    pub fn toggle_pause(&mut self, ctx: &CallContext) -> Result<bool> {
        self.ensure_owner(ctx)?;

        let mut draft = self.state.begin();
        let paused = !draft.global().system_paused;
        draft.global_mut().system_paused = paused;
        self.state.commit(draft)?;

        info!(paused, "Pause toggled");
        Ok(paused)
    }

    /// Move custodial value to the owner (owner only)
    ///
    /// The transfer collaborator enforces the custodial balance. Ledger
    /// state is not touched.
    pub fn withdraw(&mut self, ctx: &CallContext, amount: Amount) -> Result<()> {
        self.ensure_owner(ctx)?;
        if amount.is_zero() {
            return Err(Error::ZeroAmount);
        }

        let owner = self.state.global().owner.clone();
        self.transfer.transfer(amount, &self.custody, &owner)?;

        info!(%owner, %amount, units = %amount.to_units(), "Custodial funds withdrawn");
        Ok(())
    }
}
