//! In-process collaborators for tests, demos and embedding

use super::{MintError, RewardIssuer, TransferError, ValueTransfer};
use crate::types::{Address, Amount};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Balance book that settles transfers immediately
#[derive(Debug, Default)]
pub struct InMemoryBank {
    inner: Mutex<BankBook>,
}

#[derive(Debug, Default)]
struct BankBook {
    balances: HashMap<Address, Amount>,
    frozen: HashSet<Address>,
    offline: bool,
}

impl InMemoryBank {
    /// Create empty bank
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account out of thin air (test funding)
    pub fn deposit(&self, account: &Address, amount: Amount) {
        let mut book = self.inner.lock();
        let balance = book.balances.entry(account.clone()).or_default();
        *balance = balance.checked_add(amount).unwrap_or(Amount::new(u64::MAX));
    }

    /// Current balance
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.inner
            .lock()
            .balances
            .get(account)
            .copied()
            .unwrap_or_default()
    }

    /// Reject every transfer sent from `account`
    pub fn freeze(&self, account: &Address) {
        self.inner.lock().frozen.insert(account.clone());
    }

    /// Lift a freeze
    pub fn unfreeze(&self, account: &Address) {
        self.inner.lock().frozen.remove(account);
    }

    /// Reject every transfer while set
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline;
    }
}

impl ValueTransfer for InMemoryBank {
    fn transfer(&self, amount: Amount, from: &Address, to: &Address) -> Result<(), TransferError> {
        let mut book = self.inner.lock();

        if book.offline {
            warn!(%from, %to, %amount, "Bank offline, transfer rejected");
            return Err(TransferError::Rejected("bank offline".to_string()));
        }
        if book.frozen.contains(from) {
            return Err(TransferError::Frozen(from.to_string()));
        }

        let available = book.balances.get(from).copied().unwrap_or_default();
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                required: amount,
                available,
            });
        }

        if from == to {
            return Ok(());
        }

        let credited = book
            .balances
            .get(to)
            .copied()
            .unwrap_or_default()
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected(format!("balance overflow for {}", to)))?;

        book.balances
            .insert(from.clone(), Amount::new(available.micro() - amount.micro()));
        book.balances.insert(to.clone(), credited);

        debug!(%from, %to, %amount, "Transfer settled");
        Ok(())
    }
}

/// Fungible reward credit ledger
#[derive(Debug, Default)]
pub struct InMemoryRewardToken {
    inner: Mutex<TokenBook>,
}

#[derive(Debug, Default)]
struct TokenBook {
    balances: HashMap<Address, Amount>,
    total_supply: Amount,
    supply_cap: Option<Amount>,
    offline: bool,
}

impl InMemoryRewardToken {
    /// Create uncapped token
    pub fn new() -> Self {
        Self::default()
    }

    /// Create token with a maximum total supply
    pub fn with_supply_cap(cap: Amount) -> Self {
        let token = Self::default();
        token.inner.lock().supply_cap = Some(cap);
        token
    }

    /// Reward balance of an account
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.inner
            .lock()
            .balances
            .get(account)
            .copied()
            .unwrap_or_default()
    }

    /// Total minted so far
    pub fn total_supply(&self) -> Amount {
        self.inner.lock().total_supply
    }

    /// Reject every mint while set
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline;
    }
}

impl RewardIssuer for InMemoryRewardToken {
    fn mint(&self, amount: Amount, to: &Address) -> Result<(), MintError> {
        let mut book = self.inner.lock();

        if book.offline {
            warn!(%to, %amount, "Reward issuer offline, mint rejected");
            return Err(MintError::Unavailable("issuer offline".to_string()));
        }

        let cap = book.supply_cap.unwrap_or(Amount::new(u64::MAX));
        let remaining = Amount::new(cap.micro().saturating_sub(book.total_supply.micro()));
        if amount > remaining {
            return Err(MintError::SupplyCapExceeded {
                requested: amount,
                remaining,
            });
        }

        // Bounded by the cap check above
        book.total_supply = Amount::new(book.total_supply.micro() + amount.micro());
        let balance = book.balances.entry(to.clone()).or_default();
        *balance = Amount::new(balance.micro() + amount.micro());

        debug!(%to, %amount, "Reward minted");
        Ok(())
    }
}
