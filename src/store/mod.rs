//! The persistence collaborator. A `Store` keeps every user's transactions keyed by the user's
//! email and hands them back in the order they were appended.

#[cfg(test)]
mod memory;
mod migrations;
mod sqlite;

#[cfg(test)]
pub(crate) use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Res;
use crate::model::{Entry, Transaction, TxnId};

/// An append-only store of transactions.
///
/// Implementations must return `list` results in append order and must either durably write a
/// transaction and return its id, or return an error having written nothing.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// All transactions recorded for `user_key`, oldest append first.
    async fn list(&self, user_key: &str) -> Res<Vec<Entry>>;

    /// Durably records `transaction` for `user_key` and returns the id assigned to it.
    async fn append(&self, user_key: &str, transaction: &Transaction) -> Res<TxnId>;
}
