//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `donation_ledger_donations_total` - Accepted donations
//! - `donation_ledger_donated_micro_total` - Donated micro-units
//! - `donation_ledger_bonus_claims_total` - Bonuses issued
//! - `donation_ledger_bonus_micro_total` - Bonus micro-units issued
//! - `donation_ledger_withdrawals_total` - Owner withdrawals
//! - `donation_ledger_rejections_total{kind}` - Failed operations by error kind
//! - `donation_ledger_unique_donors` - Distinct donors

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Accepted donations
    pub donations_total: IntCounter,

    /// Donated micro-units
    pub donated_micro_total: IntCounter,

    /// Bonuses issued
    pub bonus_claims_total: IntCounter,

    /// Bonus micro-units issued
    pub bonus_micro_total: IntCounter,

    /// Owner withdrawals
    pub withdrawals_total: IntCounter,

    /// Failed operations by error kind
    pub rejections_total: IntCounterVec,

    /// Distinct donors
    pub unique_donors: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector on a private registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let donations_total = IntCounter::new(
            "donation_ledger_donations_total",
            "Total number of accepted donations",
        )?;
        registry.register(Box::new(donations_total.clone()))?;

        let donated_micro_total = IntCounter::new(
            "donation_ledger_donated_micro_total",
            "Total donated micro-units",
        )?;
        registry.register(Box::new(donated_micro_total.clone()))?;

        let bonus_claims_total = IntCounter::new(
            "donation_ledger_bonus_claims_total",
            "Total number of bonuses issued",
        )?;
        registry.register(Box::new(bonus_claims_total.clone()))?;

        let bonus_micro_total = IntCounter::new(
            "donation_ledger_bonus_micro_total",
            "Total bonus micro-units issued",
        )?;
        registry.register(Box::new(bonus_micro_total.clone()))?;

        let withdrawals_total = IntCounter::new(
            "donation_ledger_withdrawals_total",
            "Total number of owner withdrawals",
        )?;
        registry.register(Box::new(withdrawals_total.clone()))?;

        let rejections_total = IntCounterVec::new(
            Opts::new(
                "donation_ledger_rejections_total",
                "Failed operations by error kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let unique_donors = IntGauge::new(
            "donation_ledger_unique_donors",
            "Number of distinct donors",
        )?;
        registry.register(Box::new(unique_donors.clone()))?;

        Ok(Self {
            donations_total,
            donated_micro_total,
            bonus_claims_total,
            bonus_micro_total,
            withdrawals_total,
            rejections_total,
            unique_donors,
            registry,
        })
    }

    /// Record accepted donation
    pub fn record_donation(&self, micro: u64, unique_donors: u64) {
        self.donations_total.inc();
        self.donated_micro_total.inc_by(micro);
        self.unique_donors.set(unique_donors as i64);
    }

    /// Record issued bonus
    pub fn record_bonus(&self, micro: u64) {
        self.bonus_claims_total.inc();
        self.bonus_micro_total.inc_by(micro);
    }

    /// Record withdrawal
    pub fn record_withdrawal(&self) {
        self.withdrawals_total.inc();
    }

    /// Record failed operation
    pub fn record_rejection(&self, kind: &str) {
        self.rejections_total.with_label_values(&[kind]).inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render the text exposition format
    pub fn encode_text(&self) -> String {
        let mut buffer = Vec::new();
        if TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .is_err()
        {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
