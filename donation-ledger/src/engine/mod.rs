//! Donation and reward state machine
//!
//! The engine validates each call, stages its effects in a draft, performs
//! the external transfer and mint calls, and only then commits. Validation
//! failures are detected before any external effect.
//!
//! - `donation` - donation submission and donor statistics
//! - `reward` - one-time bonus claim
//! - `admin` - owner-gated configuration, pause and withdrawal
//! - `query` - read-only projections

mod admin;
mod donation;
mod query;
mod reward;

use crate::integration::{RewardIssuer, ValueTransfer};
use crate::state::LedgerState;
use crate::storage::Store;
use crate::types::{Address, CallContext};
use crate::{Error, Result};

/// Core engine over a store and two external collaborators
pub struct DonationEngine<S, T, R> {
    state: LedgerState<S>,
    transfer: T,
    issuer: R,
    custody: Address,
}

impl<S, T, R> DonationEngine<S, T, R>
where
    S: Store,
    T: ValueTransfer,
    R: RewardIssuer,
{
    /// Create engine; `custody` is the account that holds donated value
    pub fn new(state: LedgerState<S>, transfer: T, issuer: R, custody: Address) -> Self {
        Self {
            state,
            transfer,
            issuer,
            custody,
        }
    }

    /// Ledger state (read access)
    pub fn state(&self) -> &LedgerState<S> {
        &self.state
    }

    /// Custodial account
    pub fn custody(&self) -> &Address {
        &self.custody
    }

    fn ensure_not_paused(&self) -> Result<()> {
        if self.state.global().system_paused {
            return Err(Error::SystemPaused);
        }
        Ok(())
    }

    fn ensure_owner(&self, ctx: &CallContext) -> Result<()> {
        if ctx.caller != self.state.global().owner {
            return Err(Error::NotOwner(ctx.caller.to_string()));
        }
        Ok(())
    }
}
