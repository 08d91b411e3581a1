//! The ledger aggregator: one user's transactions, the atomic append operation, and the
//! statistics derived from them.

mod history;
mod series;
mod summary;

pub use history::HistoryRow;
pub use series::{days_in_month, DayBucket, Series, SeriesKind, WeekBucket};
pub use summary::{CategoryTotal, SummaryView};

use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{Amount, Candidate, Category, Entry, Transaction, TxnId};
use crate::store::Store;
use crate::Result;
use anyhow::Context;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{debug, warn};

/// The transactions of exactly one user, in the order they were recorded.
///
/// A `Ledger` only grows. Entries are never edited or removed, and the only way to add one is
/// `append`, which writes to the store first and records the entry in memory only if the write
/// succeeded.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Ledger {
    owner: String,
    entries: Vec<Entry>,
}

impl Ledger {
    /// Creates an empty ledger for `owner` (the user's email).
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            entries: Vec::new(),
        }
    }

    /// Creates a ledger for `owner` from entries previously returned by a store, keeping their
    /// order.
    pub fn hydrate(owner: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            owner: owner.into(),
            entries,
        }
    }

    /// Loads `owner`'s ledger from `store`.
    pub async fn load<S>(store: &S, owner: impl Into<String>, timeout: Duration) -> Result<Self>
    where
        S: Store + ?Sized,
    {
        let owner = owner.into();
        let entries = match tokio::time::timeout(timeout, store.list(&owner)).await {
            Ok(listed) => listed
                .with_context(|| format!("Unable to load the transactions for {owner}"))
                .pub_result(ErrorType::Persistence)?,
            Err(_) => {
                return Err(Error::msg(
                    ErrorType::Persistence,
                    format!(
                        "Timed out after {timeout:?} loading the transactions for {owner}"
                    ),
                ))
            }
        };
        debug!("Loaded {} transactions for {owner}", entries.len());
        Ok(Self::hydrate(owner, entries))
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries in insertion order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.entries.iter().map(|e| &e.transaction)
    }

    /// Validates `candidate` and appends it.
    ///
    /// The steps are: validate, write to `store` under this ledger's owner, then push onto the
    /// in-memory entries. A validation failure never reaches the store. A store failure, or a
    /// store that does not answer within `timeout`, leaves the ledger exactly as it was.
    ///
    /// # Errors
    /// - `ErrorType::Validation` if the amount is not positive or exceeds `Amount::MAX`, the
    ///   category is unknown, or the date or time cannot be parsed.
    /// - `ErrorType::Persistence` if the store write fails or times out.
    pub async fn append<S>(
        &mut self,
        store: &S,
        candidate: Candidate,
        timeout: Duration,
    ) -> Result<TxnId>
    where
        S: Store + ?Sized,
    {
        let transaction = Transaction::try_from(candidate)
            .context("The transaction was rejected")
            .pub_result(ErrorType::Validation)?;

        let id = match tokio::time::timeout(timeout, store.append(&self.owner, &transaction)).await
        {
            Ok(written) => written
                .context("Unable to save the transaction, it was not recorded")
                .pub_result(ErrorType::Persistence)?,
            Err(_) => {
                warn!("Store append timed out for {}", self.owner);
                return Err(Error::msg(
                    ErrorType::Persistence,
                    format!(
                        "Timed out after {timeout:?} saving the transaction, it was not recorded"
                    ),
                ));
            }
        };

        debug!("Appended transaction {id} for {}", self.owner);
        self.entries.push(Entry::new(id.clone(), transaction));
        Ok(id)
    }

    /// The sum of every amount. Zero for an empty ledger.
    pub fn total(&self) -> Amount {
        self.transactions().map(|t| t.amount()).sum()
    }

    /// The category with the most transactions. When two categories have the same count, the one
    /// that appears first in the ledger wins.
    ///
    /// # Errors
    /// `ErrorType::EmptyLedger` if there are no transactions.
    pub fn most_frequent_category(&self) -> Result<Category> {
        summary::mode(&self.entries).ok_or_else(empty_ledger)
    }

    /// Computes every statistic at once, using `today` to decide which month is "current" for the
    /// daily series.
    pub fn summarize_at(&self, kind: SeriesKind, today: NaiveDate) -> SummaryView {
        SummaryView::compute(&self.entries, kind, today)
    }

    /// Computes every statistic at once against the local date.
    pub fn summarize(&self, kind: SeriesKind) -> SummaryView {
        self.summarize_at(kind, chrono::Local::now().date_naive())
    }

    /// The entries newest first, numbered from 1, for display.
    pub fn history(&self) -> Vec<HistoryRow> {
        history::history(&self.entries)
    }
}

pub(crate) fn empty_ledger() -> Error {
    Error::msg(
        ErrorType::EmptyLedger,
        "There are no transactions yet, so there is no most frequent category",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const TIMEOUT: Duration = Duration::from_secs(5);
    const USER: &str = "ada@example.com";

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_append_then_summarize() {
        let store = MemoryStore::default();
        let mut ledger = Ledger::new(USER);
        ledger
            .append(
                &store,
                Candidate::new("2024-01-01", "Coffee", "4.50", "Food"),
                TIMEOUT,
            )
            .await
            .unwrap();

        let view = ledger.summarize_at(SeriesKind::Weekly, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(view.total().value(), dec("4.50"));
        assert_eq!(view.most_frequent_category().unwrap(), Category::Food);
        assert_eq!(store.list_now(USER).len(), 1);
    }

    #[tokio::test]
    async fn test_total_is_sum_in_any_order() {
        let amounts = ["0.10", "19.99", "0.20", "1000", "3.333"];
        let store = MemoryStore::default();

        let mut forward = Ledger::new(USER);
        for a in amounts {
            forward
                .append(&store, Candidate::new("2024-05-01", "", a, "Other"), TIMEOUT)
                .await
                .unwrap();
        }
        let mut backward = Ledger::new("other@example.com");
        for a in amounts.iter().rev() {
            backward
                .append(&store, Candidate::new("2024-05-01", "", *a, "Other"), TIMEOUT)
                .await
                .unwrap();
        }

        let expected = dec("1023.623");
        assert_eq!(forward.total().value(), expected);
        assert_eq!(backward.total().value(), expected);
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_rejected_before_the_store() {
        let store = MemoryStore::default();
        let mut ledger = Ledger::new(USER);
        for amount in ["0", "-4.50", "0.00"] {
            let err = ledger
                .append(&store, Candidate::new("2024-01-01", "", amount, "Food"), TIMEOUT)
                .await
                .unwrap_err();
            assert!(err.is_validation(), "{amount}: {err:?}");
        }
        assert!(ledger.is_empty());
        assert_eq!(store.append_calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_signs_are_rejected() {
        let store = MemoryStore::default();
        let mut ledger = Ledger::new(USER);
        for amount in ["--5", "-$-5"] {
            let err = ledger
                .append(&store, Candidate::new("2024-01-01", "", amount, "Food"), TIMEOUT)
                .await
                .unwrap_err();
            assert!(err.is_validation(), "{amount}: {err:?}");
        }
        assert!(ledger.is_empty());
        assert_eq!(ledger.total(), Amount::ZERO);
        assert_eq!(store.append_calls(), 0);
    }

    #[tokio::test]
    async fn test_oversized_amount_is_rejected() {
        let store = MemoryStore::default();
        let mut ledger = Ledger::new(USER);
        let err = ledger
            .append(
                &store,
                Candidate::new("2024-01-01", "", "1000000000000000000000000000", "Food"),
                TIMEOUT,
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_summarize_at_the_maximum_amount() {
        let store = MemoryStore::default();
        let mut ledger = Ledger::new(USER);
        for _ in 0..3 {
            ledger
                .append(&store, Candidate::new("2024-01-01", "", "1000000000000", "Food"), TIMEOUT)
                .await
                .unwrap();
        }
        let view = ledger.summarize_at(SeriesKind::Daily, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(view.total().value(), dec("3000000000000"));
        assert_eq!(view.per_category()[0].percent, Decimal::ONE_HUNDRED);
        assert_eq!(view.series().total(), view.total());
    }

    #[test]
    fn test_total_of_hydrated_huge_amounts_does_not_panic() {
        let huge = Amount::new(Decimal::MAX);
        let entries = (0..2)
            .map(|ix| {
                Entry::new(
                    TxnId::new(ix.to_string()),
                    Transaction::new(
                        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                        None,
                        "",
                        Amount::MAX,
                        Category::Food,
                    )
                    .unwrap(),
                )
            })
            .collect();
        let ledger = Ledger::hydrate(USER, entries);
        assert_eq!(ledger.total().value(), dec("2000000000000"));
        assert_eq!(huge + huge, huge);
        let view = ledger.summarize_at(SeriesKind::Weekly, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(view.total(), ledger.total());
    }

    #[tokio::test]
    async fn test_unknown_category_is_rejected() {
        let store = MemoryStore::default();
        let mut ledger = Ledger::new(USER);
        let err = ledger
            .append(&store, Candidate::new("2024-01-01", "", "5", "Rent"), TIMEOUT)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("'Rent' is not a category"));
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_date_is_rejected() {
        let store = MemoryStore::default();
        let mut ledger = Ledger::new(USER);
        let err = ledger
            .append(&store, Candidate::new("2024-13-01", "", "5", "Food"), TIMEOUT)
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_store_failure_leaves_ledger_unchanged() {
        let store = MemoryStore::default();
        store.fail_appends(true);
        let mut ledger = Ledger::new(USER);
        let err = ledger
            .append(
                &store,
                Candidate::new("2024-01-01", "Coffee", "4.50", "Food"),
                TIMEOUT,
            )
            .await
            .unwrap_err();
        assert!(err.is_persistence());
        assert!(err.to_string().contains("it was not recorded"));
        assert!(ledger.is_empty());
        assert!(store.list_now(USER).is_empty());
    }

    #[tokio::test]
    async fn test_failure_after_success_keeps_earlier_entries() {
        let store = MemoryStore::default();
        let mut ledger = Ledger::new(USER);
        ledger
            .append(&store, Candidate::new("2024-01-01", "", "1", "Food"), TIMEOUT)
            .await
            .unwrap();
        store.fail_appends(true);
        let before = ledger.clone();
        assert!(ledger
            .append(&store, Candidate::new("2024-01-02", "", "2", "Food"), TIMEOUT)
            .await
            .is_err());
        assert_eq!(ledger, before);
    }

    #[tokio::test]
    async fn test_store_timeout_is_persistence_error() {
        let store = MemoryStore::default();
        store.delay_appends(Duration::from_millis(200));
        let mut ledger = Ledger::new(USER);
        let err = ledger
            .append(
                &store,
                Candidate::new("2024-01-01", "", "1", "Food"),
                Duration::from_millis(10),
            )
            .await
            .unwrap_err();
        assert!(err.is_persistence());
        assert!(err.to_string().contains("Timed out after 10ms"));
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_load_keeps_store_order() {
        let store = MemoryStore::default();
        let mut ledger = Ledger::new(USER);
        for (date, cat) in [("2024-02-03", "Bills"), ("2024-01-01", "Food")] {
            ledger
                .append(&store, Candidate::new(date, "", "1", cat), TIMEOUT)
                .await
                .unwrap();
        }
        let loaded = Ledger::load(&store, USER, TIMEOUT).await.unwrap();
        assert_eq!(loaded, ledger);
        assert_eq!(
            loaded.transactions().map(|t| t.category()).collect::<Vec<_>>(),
            vec![Category::Bills, Category::Food]
        );
    }

    #[tokio::test]
    async fn test_load_failure_is_persistence_error() {
        let store = MemoryStore::default();
        store.fail_lists(true);
        let err = Ledger::load(&store, USER, TIMEOUT).await.unwrap_err();
        assert!(err.is_persistence());
    }

    #[test]
    fn test_empty_ledger() {
        let ledger = Ledger::new(USER);
        assert_eq!(ledger.total(), Amount::ZERO);
        let err = ledger.most_frequent_category().unwrap_err();
        assert!(err.is_empty_ledger());
        assert!(ledger.history().is_empty());
    }
}
