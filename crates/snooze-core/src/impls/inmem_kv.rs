//! InMemoryKvStore - テスト・開発用の key-value ストア
//!
//! 書き込み / 読み込みの失敗を注入できる（永続化失敗時の振る舞いを検証するため）。

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::ports::{KvStore, StoreError};

#[derive(Default)]
pub struct InMemoryKvStore {
    values: Mutex<HashMap<String, Value>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get` fail until reset.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `set` fail until reset.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Raw value under `key`, bypassing failure injection.
    pub async fn raw(&self, key: &str) -> Option<Value> {
        self.values.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("injected read failure for {key}")));
        }
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("injected write failure for {key}")));
        }
        self.values.lock().await.insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
