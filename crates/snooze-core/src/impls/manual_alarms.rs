//! ManualAlarms - テスト用のアラーム
//!
//! 時間では発火しない。テストが `fire_due` を呼んだときだけ発火する。

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::ports::{AlarmHost, HostError};

#[derive(Default)]
pub struct ManualAlarms {
    pending: Mutex<BTreeMap<String, DateTime<Utc>>>,
    creates: AtomicUsize,
    fail_creates: AtomicBool,
}

impl ManualAlarms {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, DateTime<Utc>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn pending(&self) -> BTreeMap<String, DateTime<Utc>> {
        self.lock().clone()
    }

    pub fn when(&self, name: &str) -> Option<DateTime<Utc>> {
        self.lock().get(name).copied()
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// Fire (remove and return) every alarm due at `now`, earliest first.
    pub fn fire_due(&self, now: DateTime<Utc>) -> Vec<String> {
        let mut pending = self.lock();
        let mut due: Vec<(DateTime<Utc>, String)> = pending
            .iter()
            .filter(|(_, when)| **when <= now)
            .map(|(name, when)| (*when, name.clone()))
            .collect();
        due.sort();
        for (_, name) in &due {
            pending.remove(name);
        }
        due.into_iter().map(|(_, name)| name).collect()
    }
}

#[async_trait]
impl AlarmHost for ManualAlarms {
    async fn create(&self, name: &str, when: DateTime<Utc>) -> Result<(), HostError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(HostError::Rejected(format!("injected alarm failure for {name}")));
        }
        self.lock().insert(name.to_string(), when);
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self, name: &str) -> bool {
        self.lock().remove(name).is_some()
    }
}
