use super::DonationEngine;
use crate::integration::{RewardIssuer, ValueTransfer};
use crate::storage::Store;
use crate::types::{Amount, CallContext, BONUS_RATE};
use crate::{Error, Result};
use tracing::{error, info, warn};

impl<S, T, R> DonationEngine<S, T, R>
where
    S: Store,
    T: ValueTransfer,
    R: RewardIssuer,
{
    /// Issue the one-time bonus to `ctx.caller`
    ///
    /// The claimed flag is committed before minting. If the mint fails the
    /// previous record is written back, so the donor can retry and a
    /// successful mint is never left without the flag.
    /// Returns the bonus amount.
    pub fn claim_bonus(&mut self, ctx: &CallContext) -> Result<Amount> {
        self.ensure_not_paused()?;

        let threshold = self.state.global().bonus_threshold();
        let previous = self.state.donor(&ctx.caller)?.unwrap_or_default();
        if previous.total_donated < threshold {
            return Err(Error::InsufficientCumulativeDonations {
                total: previous.total_donated,
                threshold,
            });
        }

        if previous.bonus_claimed {
            return Err(Error::AlreadyClaimed(ctx.caller.to_string()));
        }

        let bonus = previous.total_donated.div_floor(BONUS_RATE);

        let mut claimed = previous.clone();
        claimed.bonus_claimed = true;
        let mut draft = self.state.begin();
        draft.put_donor(ctx.caller.clone(), claimed);
        self.state.commit(draft)?;

        if let Err(mint_error) = self.issuer.mint(bonus, &ctx.caller) {
            warn!(
                donor = %ctx.caller,
                %bonus,
                error = %mint_error,
                "Bonus mint failed, restoring claim"
            );

            let mut restore = self.state.begin();
            restore.put_donor(ctx.caller.clone(), previous);
            if let Err(e) = self.state.commit(restore) {
                error!(
                    donor = %ctx.caller,
                    error = %e,
                    "Could not restore donor after failed bonus mint"
                );
            }
            return Err(mint_error.into());
        }

        info!(
            donor = %ctx.caller,
            %bonus,
            units = %bonus.to_units(),
            total_donated = %previous.total_donated,
            "Bonus claimed"
        );

        Ok(bonus)
    }
}
