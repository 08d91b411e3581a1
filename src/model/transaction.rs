use crate::error::Res;
use crate::model::{Amount, Category};
use anyhow::{bail, Context};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M:%S";
const SHORT_TIME_FORMAT: &str = "%H:%M";

/// The identifier a store assigns to a transaction when it is appended.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxnId(String);

impl TxnId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TxnId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw transaction input as it arrives from a form or the command line. Nothing here has been
/// checked; call `Transaction::try_from(candidate)` to validate it.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM` or `HH:MM:SS`, if the entry records a time of day.
    pub time: Option<String>,
    pub description: String,
    pub amount: String,
    pub category: String,
}

impl Candidate {
    pub fn new(
        date: impl Into<String>,
        description: impl Into<String>,
        amount: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            time: None,
            description: description.into(),
            amount: amount.into(),
            category: category.into(),
        }
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }
}

/// A validated expense. Once constructed it is never modified.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedTransaction")]
pub struct Transaction {
    date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<NaiveTime>,
    description: String,
    amount: Amount,
    category: Category,
}

impl Transaction {
    /// Builds a transaction from already-typed parts, enforcing the same rules as `Candidate`
    /// validation: the amount must be greater than zero and no more than `Amount::MAX`.
    pub fn new(
        date: NaiveDate,
        time: Option<NaiveTime>,
        description: impl Into<String>,
        amount: Amount,
        category: Category,
    ) -> Res<Self> {
        if !amount.is_positive() {
            bail!("The amount must be greater than zero, got {amount}");
        }
        if amount > Amount::MAX {
            bail!("The amount must be at most {}, got {amount}", Amount::MAX);
        }
        Ok(Self {
            date,
            time,
            description: description.into(),
            amount,
            category,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time(&self) -> Option<NaiveTime> {
        self.time
    }

    /// The moment used for ordering. An entry without a time of day sorts as midnight.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(self.time.unwrap_or(NaiveTime::MIN))
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

/// The serialized shape of a `Transaction`, checked by `Transaction::new` before it is accepted.
#[derive(Deserialize)]
struct UncheckedTransaction {
    date: NaiveDate,
    #[serde(default)]
    time: Option<NaiveTime>,
    #[serde(default)]
    description: String,
    amount: Amount,
    category: Category,
}

impl TryFrom<UncheckedTransaction> for Transaction {
    type Error = anyhow::Error;

    fn try_from(t: UncheckedTransaction) -> Res<Self> {
        Transaction::new(t.date, t.time, t.description, t.amount, t.category)
    }
}

impl TryFrom<Candidate> for Transaction {
    type Error = anyhow::Error;

    fn try_from(candidate: Candidate) -> Res<Self> {
        let date = parse_date(&candidate.date)?;
        let time = match candidate.time.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(t) => Some(parse_time(t)?),
        };
        let amount = Amount::from_str(&candidate.amount).context("Invalid amount")?;
        let category = Category::parse(&candidate.category)?;
        Transaction::new(date, time, candidate.description, amount, category)
    }
}

pub(crate) fn parse_date(s: &str) -> Res<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .with_context(|| format!("'{s}' is not a valid date, expected YYYY-MM-DD"))
}

pub(crate) fn parse_time(s: &str) -> Res<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, SHORT_TIME_FORMAT))
        .with_context(|| format!("'{s}' is not a valid time, expected HH:MM or HH:MM:SS"))
}

/// A transaction as held by a ledger or returned from a store: the transaction and its id.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: TxnId,
    #[serde(flatten)]
    pub transaction: Transaction,
}

impl Entry {
    pub fn new(id: TxnId, transaction: Transaction) -> Self {
        Self { id, transaction }
    }
}
