//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Lifetime total grows by exactly the donated amount
//! - Donor totals equal the sum of their history
//! - Unique donor count matches distinct addresses
//! - Sequence ids are dense from zero
//! - Streaks follow the one-day window
//! - The bonus is issued at most once

use donation_ledger::integration::{InMemoryBank, InMemoryRewardToken};
use donation_ledger::state::LedgerState;
use donation_ledger::types::{Address, Amount, CallContext, ONE_DAY_IN_BLOCKS};
use donation_ledger::{DonationEngine, Error, MemoryStore};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

const MINIMUM: u64 = 1_000_000;

type TestEngine = DonationEngine<MemoryStore, Arc<InMemoryBank>, Arc<InMemoryRewardToken>>;

fn donor(index: usize) -> Address {
    Address::new(format!("SP-DONOR-{}", index))
}

fn at(caller: &Address, height: u64) -> CallContext {
    CallContext::new(caller.clone(), height)
}

/// Engine over in-memory collaborators, with every donor funded
fn create_test_engine(
    donors: usize,
) -> (TestEngine, Arc<InMemoryBank>, Arc<InMemoryRewardToken>) {
    let bank = Arc::new(InMemoryBank::new());
    let token = Arc::new(InMemoryRewardToken::new());
    for i in 0..donors {
        bank.deposit(&donor(i), Amount::new(1_000 * MINIMUM));
    }

    let state = LedgerState::open(
        MemoryStore::new(),
        Address::new("SP-OWNER"),
        Amount::new(MINIMUM),
    )
    .unwrap();
    let custody = Address::new("SP-CUSTODY");
    let engine = DonationEngine::new(state, bank.clone(), token.clone(), custody);
    (engine, bank, token)
}

/// Strategy for one donation: (donor index, amount, blocks since previous call)
fn donation_strategy() -> impl Strategy<Value = (usize, u64, u64)> {
    (0usize..4, MINIMUM..5 * MINIMUM, 0u64..2 * ONE_DAY_IN_BLOCKS)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: Accepted donations keep every aggregate consistent
    #[test]
    fn prop_aggregates_track_history(ops in prop::collection::vec(donation_strategy(), 1..40)) {
        let (mut engine, _bank, token) = create_test_engine(4);
        let mut height = 1;
        let mut seen = BTreeSet::new();

        for (i, (index, micro, gap)) in ops.iter().enumerate() {
            height += gap;
            let caller = donor(*index);
            let before = engine.get_statistics();

            let sequence_id = engine
                .submit_donation(&at(&caller, height), Amount::new(*micro), None)
                .unwrap();
            seen.insert(caller);

            let after = engine.get_statistics();
            prop_assert_eq!(sequence_id, i as u64);
            prop_assert_eq!(after.next_sequence, before.next_sequence + 1);
            prop_assert_eq!(
                after.total_lifetime_amount.micro() - before.total_lifetime_amount.micro(),
                *micro
            );
            prop_assert_eq!(after.total_unique_donors, seen.len() as u64);
        }

        // Dense ids from zero
        let stats = engine.get_statistics();
        for id in 0..stats.next_sequence {
            prop_assert!(engine.get_donation(id).is_ok());
        }
        prop_assert!(matches!(
            engine.get_donation(stats.next_sequence),
            Err(Error::RecordNotFound(_))
        ));

        let mut lifetime = 0u64;
        for address in &seen {
            let record = engine.audit_donor(address).unwrap();
            let history: u64 = engine
                .get_donor_donations(address)
                .unwrap()
                .iter()
                .map(|e| e.amount.micro())
                .sum();
            prop_assert_eq!(record.total_donated.micro(), history);
            prop_assert_eq!(token.balance_of(address), record.total_donated);
            lifetime += history;
        }
        prop_assert_eq!(stats.total_lifetime_amount.micro(), lifetime);
    }

    /// Property: Rejected donations never change state or balances
    #[test]
    fn prop_rejected_donations_are_inert(micro in 0u64..MINIMUM, purpose_len in 65usize..100) {
        let (mut engine, bank, token) = create_test_engine(1);
        let caller = donor(0);
        let before = engine.get_statistics();

        let below = engine.submit_donation(&at(&caller, 1), Amount::new(micro), None);
        prop_assert!(below.is_err());

        let long_purpose = engine.submit_donation(
            &at(&caller, 1),
            Amount::new(MINIMUM),
            Some("x".repeat(purpose_len)),
        );
        let is_invalid_purpose = matches!(long_purpose, Err(Error::InvalidPurpose { .. }));
        prop_assert!(is_invalid_purpose);

        prop_assert_eq!(engine.get_statistics(), before);
        prop_assert!(engine.get_donor(&caller).is_err());
        prop_assert_eq!(bank.balance_of(&caller), Amount::new(1_000 * MINIMUM));
        prop_assert_eq!(token.balance_of(&caller), Amount::ZERO);
    }

    /// Property: Streak grows inside the one-day window and resets outside it
    #[test]
    fn prop_streak_follows_window(
        gaps in prop::collection::vec(0u64..2 * ONE_DAY_IN_BLOCKS, 0..30),
    ) {
        let (mut engine, _bank, _token) = create_test_engine(1);
        let caller = donor(0);
        let mut height = 10;

        engine
            .submit_donation(&at(&caller, height), Amount::new(MINIMUM), None)
            .unwrap();
        let mut expected = 1;

        for gap in gaps {
            height += gap;
            engine
                .submit_donation(&at(&caller, height), Amount::new(MINIMUM), None)
                .unwrap();
            expected = if gap < ONE_DAY_IN_BLOCKS { expected + 1 } else { 1 };

            let record = engine.get_donor(&caller).unwrap();
            prop_assert_eq!(record.streak, expected);
            prop_assert_eq!(record.last_donation_height, height);
        }
    }

    /// Property: The bonus is issued exactly once, whatever follows
    #[test]
    fn prop_bonus_issued_once(
        donations in prop::collection::vec(MINIMUM..3 * MINIMUM, 4..12),
        later in prop::collection::vec(MINIMUM..3 * MINIMUM, 0..5),
    ) {
        let (mut engine, _bank, token) = create_test_engine(1);
        let caller = donor(0);
        let threshold = 10 * MINIMUM;
        let mut height = 1;

        let mut claims = BTreeMap::new();
        for micro in donations.iter().chain(later.iter()) {
            height += 1;
            engine
                .submit_donation(&at(&caller, height), Amount::new(*micro), None)
                .unwrap();

            let record = engine.get_donor(&caller).unwrap();
            let minted_before = token.balance_of(&caller);
            let result = engine.claim_bonus(&at(&caller, height));

            match result {
                Ok(bonus) => {
                    prop_assert!(record.total_donated.micro() >= threshold);
                    prop_assert!(!record.bonus_claimed);
                    prop_assert_eq!(bonus.micro(), record.total_donated.micro() / 10);
                    prop_assert_eq!(
                        token.balance_of(&caller).micro(),
                        minted_before.micro() + bonus.micro()
                    );
                    claims.insert(height, bonus);
                }
                Err(Error::AlreadyClaimed(_)) => prop_assert!(record.bonus_claimed),
                Err(Error::InsufficientCumulativeDonations { .. }) => {
                    prop_assert!(record.total_donated.micro() < threshold)
                }
                Err(other) => prop_assert!(false, "unexpected error {}", other),
            }
        }

        prop_assert!(claims.len() <= 1);
        let record = engine.get_donor(&caller).unwrap();
        prop_assert_eq!(record.bonus_claimed, !claims.is_empty());
        prop_assert_eq!(record.bonus_claimed, record.total_donated.micro() >= threshold);
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use donation_ledger::clock::ManualHeight;
    use donation_ledger::{Config, DonationLedger};
    use tempfile::TempDir;

    struct Scenario {
        ledger: DonationLedger,
        bank: Arc<InMemoryBank>,
        token: Arc<InMemoryRewardToken>,
        clock: Arc<ManualHeight>,
        owner: Address,
        custody: Address,
        _temp_dir: TempDir,
    }

    /// Create test ledger with temp directory
    async fn create_test_ledger() -> Scenario {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        config.ledger.initial_minimum_donation = MINIMUM;
        let owner = config.ledger.owner();
        let custody = config.ledger.custody();

        let bank = Arc::new(InMemoryBank::new());
        let token = Arc::new(InMemoryRewardToken::new());
        let clock = Arc::new(ManualHeight::new(100));
        let ledger = DonationLedger::open(config, bank.clone(), token.clone(), clock.clone())
            .await
            .unwrap();

        Scenario {
            ledger,
            bank,
            token,
            clock,
            owner,
            custody,
            _temp_dir: temp_dir,
        }
    }

    #[tokio::test]
    async fn test_first_donation_at_minimum() {
        let s = create_test_ledger().await;
        let a = donor(0);
        s.bank.deposit(&a, Amount::new(MINIMUM));

        let id = s
            .ledger
            .submit_donation(&a, Amount::new(MINIMUM), None)
            .await
            .unwrap();
        assert_eq!(id, 0);

        let stats = s.ledger.get_statistics().await.unwrap();
        assert_eq!(stats.total_lifetime_amount, Amount::new(MINIMUM));
        assert_eq!(stats.total_unique_donors, 1);
        assert_eq!(s.token.balance_of(&a), Amount::new(MINIMUM));
        assert_eq!(s.bank.balance_of(&s.custody), Amount::new(MINIMUM));

        let record = s.ledger.get_donor(&a).await.unwrap();
        assert_eq!(record.streak, 1);
        assert_eq!(record.last_donation_height, 100);

        s.ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_below_minimum_changes_nothing() {
        let s = create_test_ledger().await;
        let a = donor(0);
        s.bank.deposit(&a, Amount::new(MINIMUM));
        let before = s.ledger.get_statistics().await.unwrap();

        let err = s
            .ledger
            .submit_donation(&a, Amount::new(500_000), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AmountBelowMinimum { .. }));

        assert_eq!(s.ledger.get_statistics().await.unwrap(), before);
        assert!(matches!(
            s.ledger.get_donor(&a).await,
            Err(Error::RecordNotFound(_))
        ));
        assert_eq!(s.bank.balance_of(&a), Amount::new(MINIMUM));
        assert_eq!(s.token.balance_of(&a), Amount::ZERO);

        s.ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_bonus_claim_once() {
        let s = create_test_ledger().await;
        let a = donor(0);
        s.bank.deposit(&a, Amount::new(20 * MINIMUM));

        for _ in 0..10 {
            s.clock.advance(1);
            s.ledger
                .submit_donation(&a, Amount::new(MINIMUM), None)
                .await
                .unwrap();
        }

        let bonus = s.ledger.claim_bonus(&a).await.unwrap();
        assert_eq!(bonus, Amount::new(MINIMUM));
        assert!(s.ledger.get_donor(&a).await.unwrap().bonus_claimed);
        assert_eq!(s.token.balance_of(&a), Amount::new(11 * MINIMUM));

        let err = s.ledger.claim_bonus(&a).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyClaimed(_)));

        // Further giving never reopens the claim
        s.ledger
            .submit_donation(&a, Amount::new(5 * MINIMUM), None)
            .await
            .unwrap();
        let err = s.ledger.claim_bonus(&a).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyClaimed(_)));
        assert_eq!(s.ledger.metrics().bonus_claims_total.get(), 1);

        s.ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_pause_and_resume() {
        let s = create_test_ledger().await;
        let a = donor(0);
        let b = donor(1);
        s.bank.deposit(&a, Amount::new(MINIMUM));
        s.bank.deposit(&b, Amount::new(MINIMUM));

        assert!(s.ledger.toggle_pause(&s.owner).await.unwrap());
        for caller in [&a, &b] {
            let err = s
                .ledger
                .submit_donation(caller, Amount::new(MINIMUM), None)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::SystemPaused));
        }

        assert!(!s.ledger.toggle_pause(&s.owner).await.unwrap());
        s.ledger
            .submit_donation(&a, Amount::new(MINIMUM), None)
            .await
            .unwrap();
        s.ledger
            .submit_donation(&b, Amount::new(MINIMUM), None)
            .await
            .unwrap();
        assert_eq!(
            s.ledger.get_statistics().await.unwrap().total_unique_donors,
            2
        );

        s.ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_withdraw_guards() {
        let s = create_test_ledger().await;
        let a = donor(0);
        s.bank.deposit(&a, Amount::new(3 * MINIMUM));
        s.ledger
            .submit_donation(&a, Amount::new(3 * MINIMUM), None)
            .await
            .unwrap();
        let before = s.ledger.get_statistics().await.unwrap();

        let err = s
            .ledger
            .withdraw(&a, Amount::new(MINIMUM))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotOwner(_)));

        let err = s
            .ledger
            .withdraw(&s.owner, Amount::new(4 * MINIMUM))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TransferFailed(_)));
        assert_eq!(s.bank.balance_of(&s.custody), Amount::new(3 * MINIMUM));
        assert_eq!(s.ledger.get_statistics().await.unwrap(), before);

        s.ledger
            .withdraw(&s.owner, Amount::new(2 * MINIMUM))
            .await
            .unwrap();
        assert_eq!(s.bank.balance_of(&s.owner), Amount::new(2 * MINIMUM));
        assert_eq!(s.bank.balance_of(&s.custody), Amount::new(MINIMUM));
        assert_eq!(s.ledger.get_statistics().await.unwrap(), before);

        s.ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_streak_resets_after_a_day() {
        let s = create_test_ledger().await;
        let a = donor(0);
        s.bank.deposit(&a, Amount::new(10 * MINIMUM));

        s.ledger.submit_donation(&a, Amount::new(MINIMUM), None).await.unwrap();
        s.clock.advance(ONE_DAY_IN_BLOCKS - 1);
        s.ledger.submit_donation(&a, Amount::new(MINIMUM), None).await.unwrap();
        assert_eq!(s.ledger.get_donor(&a).await.unwrap().streak, 2);

        s.clock.advance(ONE_DAY_IN_BLOCKS);
        s.ledger.submit_donation(&a, Amount::new(MINIMUM), None).await.unwrap();
        assert_eq!(s.ledger.get_donor(&a).await.unwrap().streak, 1);

        let history = s.ledger.get_donor_donations(&a).await.unwrap();
        let heights: Vec<_> = history.iter().map(|e| e.height).collect();
        assert_eq!(
            heights,
            vec![
                100,
                100 + ONE_DAY_IN_BLOCKS - 1,
                100 + 2 * ONE_DAY_IN_BLOCKS - 1
            ]
        );

        s.ledger.shutdown().await.unwrap();
    }
}
