//! Types that represent the core data model, such as `Transaction` and `Category`.
mod amount;
mod category;
mod transaction;

pub use amount::{Amount, AmountError};
pub use category::Category;
pub use transaction::{Candidate, Entry, Transaction, TxnId};
pub(crate) use transaction::{parse_date, parse_time, DATE_FORMAT, TIME_FORMAT};
