//! fintrack: a personal finance tracker.
//!
//! A signed-in user records expenses into a `Ledger`, which persists them through a `Store` and
//! derives the statistics shown by `fintrack summary`: total spend, the most frequent category,
//! spend per category and a weekly or daily series.

pub mod args;
mod auth;
pub mod commands;
mod config;
mod error;
mod ledger;
mod model;
mod session;
mod store;
mod utils;

pub use auth::{Authenticator, Identity, Mode};
pub use config::Config;
pub use error::{Error, ErrorType, Result};
pub use ledger::{
    days_in_month, CategoryTotal, DayBucket, HistoryRow, Ledger, Series, SeriesKind, SummaryView,
    WeekBucket,
};
pub use model::{Amount, AmountError, Candidate, Category, Entry, Transaction, TxnId};
pub use session::Session;
pub use store::{SqliteStore, Store};
