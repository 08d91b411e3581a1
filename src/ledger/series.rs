use crate::model::{Amount, Entry};
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which time series a summary should carry.
#[derive(
    Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    /// Weekly totals across the whole ledger, weeks starting on Monday.
    Weekly,
    /// Daily totals for the current month, every day present.
    #[default]
    Daily,
}

serde_plain::derive_display_from_serialize!(SeriesKind);
serde_plain::derive_fromstr_from_deserialize!(SeriesKind);

/// The spend in the ISO week (Monday through Sunday) that starts on `week_start`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct WeekBucket {
    pub week_start: NaiveDate,
    pub total: Amount,
}

/// The spend on one day of the month.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct DayBucket {
    pub day: u32,
    pub total: Amount,
}

/// A chart-ready time series.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Series {
    /// One bucket per week that has at least one transaction, oldest first. Empty weeks are
    /// omitted.
    Weekly { buckets: Vec<WeekBucket> },
    /// One bucket for every day of `year`-`month`, day 1 first. Days without transactions are
    /// present with a zero total.
    Daily {
        year: i32,
        month: u32,
        buckets: Vec<DayBucket>,
    },
}

impl Series {
    pub(super) fn weekly(entries: &[Entry]) -> Self {
        let mut weeks: BTreeMap<NaiveDate, Amount> = BTreeMap::new();
        for entry in entries {
            let week = week_start(entry.transaction.date());
            let sum = weeks.entry(week).or_insert(Amount::ZERO);
            *sum = *sum + entry.transaction.amount();
        }
        Series::Weekly {
            buckets: weeks
                .into_iter()
                .map(|(week_start, total)| WeekBucket { week_start, total })
                .collect(),
        }
    }

    pub(super) fn daily(entries: &[Entry], today: NaiveDate) -> Self {
        let (year, month) = (today.year(), today.month());
        // Only fails at the very end of chrono's representable range.
        let days = days_in_month(year, month).unwrap_or_else(|| today.day());

        let mut buckets: Vec<DayBucket> = (1..=days)
            .map(|day| DayBucket {
                day,
                total: Amount::ZERO,
            })
            .collect();
        for entry in entries {
            let date = entry.transaction.date();
            if date.year() != year || date.month() != month {
                continue;
            }
            if let Some(bucket) = buckets.get_mut(date.day0() as usize) {
                bucket.total = bucket.total + entry.transaction.amount();
            }
        }
        Series::Daily {
            year,
            month,
            buckets,
        }
    }

    pub fn kind(&self) -> SeriesKind {
        match self {
            Series::Weekly { .. } => SeriesKind::Weekly,
            Series::Daily { .. } => SeriesKind::Daily,
        }
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        match self {
            Series::Weekly { buckets } => buckets.len(),
            Series::Daily { buckets, .. } => buckets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The sum over all buckets.
    pub fn total(&self) -> Amount {
        match self {
            Series::Weekly { buckets } => buckets.iter().map(|b| b.total).sum(),
            Series::Daily { buckets, .. } => buckets.iter().map(|b| b.total).sum(),
        }
    }

    /// `(label, total)` pairs for printing: the week's Monday as `YYYY-MM-DD`, or the day number.
    pub fn points(&self) -> Vec<(String, Amount)> {
        match self {
            Series::Weekly { buckets } => buckets
                .iter()
                .map(|b| (b.week_start.format("%Y-%m-%d").to_string(), b.total))
                .collect(),
            Series::Daily { buckets, .. } => buckets
                .iter()
                .map(|b| (b.day.to_string(), b.total))
                .collect(),
        }
    }
}

/// The number of days in `month` of `year`, computed as the day before the first of the
/// following month. Returns `None` for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some(last.day())
}

/// The Monday on or before `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}
