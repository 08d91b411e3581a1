use crate::ledger::series::{Series, SeriesKind};
use crate::model::{Amount, Category, Entry};
use crate::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// The spend in one category.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Amount,
    /// Number of transactions in the category.
    pub count: usize,
    /// Share of the overall total, rounded to one decimal place. This is the pie-chart label.
    pub percent: Decimal,
}

/// Everything the statistics screen shows, computed from a ledger in one pass.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct SummaryView {
    count: usize,
    total: Amount,
    most_frequent: Option<Category>,
    per_category: Vec<CategoryTotal>,
    series: Series,
}

impl SummaryView {
    pub(super) fn compute(entries: &[Entry], kind: SeriesKind, today: NaiveDate) -> Self {
        let total: Amount = entries.iter().map(|e| e.transaction.amount()).sum();

        let mut groups: BTreeMap<Category, (Amount, usize)> = BTreeMap::new();
        for entry in entries {
            let group = groups
                .entry(entry.transaction.category())
                .or_insert((Amount::ZERO, 0));
            group.0 = group.0 + entry.transaction.amount();
            group.1 += 1;
        }
        let per_category = groups
            .into_iter()
            .map(|(category, (sum, count))| CategoryTotal {
                category,
                total: sum,
                count,
                percent: sum.percent_of(total),
            })
            .collect();

        let series = match kind {
            SeriesKind::Weekly => Series::weekly(entries),
            SeriesKind::Daily => Series::daily(entries, today),
        };

        Self {
            count: entries.len(),
            total,
            most_frequent: mode(entries),
            per_category,
            series,
        }
    }

    /// Number of transactions summarized.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn total(&self) -> Amount {
        self.total
    }

    /// The category with the most transactions, ties going to the one seen first.
    ///
    /// # Errors
    /// `ErrorType::EmptyLedger` when the summary covers no transactions.
    pub fn most_frequent_category(&self) -> Result<Category> {
        self.most_frequent.ok_or_else(super::empty_ledger)
    }

    /// Per-category totals in form order. Categories without transactions are absent.
    pub fn per_category(&self) -> &[CategoryTotal] {
        &self.per_category
    }

    /// The total for `category`, or `None` if it has no transactions.
    pub fn category_total(&self, category: Category) -> Option<Amount> {
        self.per_category
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.total)
    }

    pub fn series(&self) -> &Series {
        &self.series
    }
}

/// The most common category. Counts are kept in first-seen order and only a strictly larger count
/// replaces the leader, so ties go to whichever category appeared earliest.
pub(super) fn mode(entries: &[Entry]) -> Option<Category> {
    let mut counts: Vec<(Category, usize)> = Vec::new();
    for entry in entries {
        let category = entry.transaction.category();
        match counts.iter_mut().find(|(c, _)| *c == category) {
            Some((_, n)) => *n += 1,
            None => counts.push((category, 1)),
        }
    }

    let mut leader: Option<(Category, usize)> = None;
    for (category, n) in counts {
        if leader.map_or(true, |(_, best)| n > best) {
            leader = Some((category, n));
        }
    }
    leader.map(|(category, _)| category)
}
