//! An in-memory `Store` for tests, with switches for making it fail or stall.

use crate::error::Res;
use crate::model::{Entry, Transaction, TxnId};
use crate::store::Store;
use anyhow::bail;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    data: Mutex<HashMap<String, Vec<Entry>>>,
    next_id: AtomicU64,
    append_calls: AtomicUsize,
    fail_appends: AtomicBool,
    fail_lists: AtomicBool,
    append_delay_ms: AtomicU64,
}

impl MemoryStore {
    /// When `fail` is true, every `append` returns an error and writes nothing.
    pub(crate) fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    /// Makes every `append` wait for `delay` before answering.
    pub(crate) fn delay_appends(&self, delay: Duration) {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.append_delay_ms.store(ms, Ordering::SeqCst);
    }

    /// How many times `append` has been called, successful or not.
    pub(crate) fn append_calls(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }

    /// What is stored for `user_key` right now.
    pub(crate) fn list_now(&self, user_key: &str) -> Vec<Entry> {
        self.data
            .lock()
            .unwrap()
            .get(user_key)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn list(&self, user_key: &str) -> Res<Vec<Entry>> {
        if self.fail_lists.load(Ordering::SeqCst) {
            bail!("The store is unreachable");
        }
        Ok(self.list_now(user_key))
    }

    async fn append(&self, user_key: &str, transaction: &Transaction) -> Res<TxnId> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.append_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_appends.load(Ordering::SeqCst) {
            bail!("The store rejected the write");
        }
        let id = TxnId::new(format!(
            "mem-{}",
            self.next_id.fetch_add(1, Ordering::SeqCst)
        ));
        self.data
            .lock()
            .unwrap()
            .entry(user_key.to_string())
            .or_default()
            .push(Entry::new(id.clone(), transaction.clone()));
        Ok(id)
    }
}
