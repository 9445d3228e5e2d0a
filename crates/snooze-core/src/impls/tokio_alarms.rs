//! TokioAlarms - tokio タイマーで実装したワンショットアラーム
//!
//! # 学習ポイント
//! - spawn したタスクを JoinHandle で取り消す（abort）
//! - 発火は mpsc で別経路に流す（作った呼び出しには返らない）
//! - 壁時計の変更に追従するため、最大 60 秒刻みで Clock を見直す

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::ports::{AlarmHost, Clock, HostError};

/// Longest single sleep before the wall clock is consulted again.
pub const MAX_SLICE: Duration = Duration::from_secs(60);

struct Timer {
    generation: u64,
    handle: JoinHandle<()>,
}

type Timers = Arc<Mutex<HashMap<String, Timer>>>;

fn lock(timers: &Timers) -> MutexGuard<'_, HashMap<String, Timer>> {
    timers.lock().unwrap_or_else(|e| e.into_inner())
}

/// TokioAlarms は名前付きのタイマーを管理
///
/// # 使用例
/// ```ignore
/// let (alarms, mut fired) = TokioAlarms::new(Arc::new(SystemClock));
/// alarms.create("wake_x", when).await?;
/// let name = fired.recv().await; // Some("wake_x")
/// ```
pub struct TokioAlarms {
    clock: Arc<dyn Clock>,
    timers: Timers,
    fired_tx: mpsc::UnboundedSender<String>,
    next_generation: AtomicU64,
}

impl TokioAlarms {
    pub fn new(clock: Arc<dyn Clock>) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let alarms = Self {
            clock,
            timers: Arc::new(Mutex::new(HashMap::new())),
            fired_tx,
            next_generation: AtomicU64::new(1),
        };
        (alarms, fired_rx)
    }

    /// Number of alarms that have not fired or been cleared.
    pub fn pending(&self) -> usize {
        lock(&self.timers).len()
    }
}

#[async_trait]
impl AlarmHost for TokioAlarms {
    async fn create(&self, name: &str, when: DateTime<Utc>) -> Result<(), HostError> {
        if self.fired_tx.is_closed() {
            return Err(HostError::Rejected("alarm receiver is gone".to_string()));
        }

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let clock = Arc::clone(&self.clock);
        let timers = Arc::clone(&self.timers);
        let tx = self.fired_tx.clone();
        let key = name.to_string();

        // Hold the map while spawning so an already-due timer cannot finish
        // before its entry exists.
        let mut guard = lock(&self.timers);
        let handle = tokio::spawn(async move {
            loop {
                let now = clock.now();
                if when <= now {
                    break;
                }
                let wait = (when - now).to_std().unwrap_or(Duration::ZERO).min(MAX_SLICE);
                tokio::time::sleep(wait).await;
            }

            {
                let mut timers = lock(&timers);
                if timers.get(&key).is_some_and(|t| t.generation == generation) {
                    timers.remove(&key);
                }
            }

            // ignore send error: the event loop may already be gone
            let _ = tx.send(key);
        });

        if let Some(previous) = guard.insert(name.to_string(), Timer { generation, handle }) {
            previous.handle.abort();
        }
        tracing::debug!(alarm = name, %when, "alarm created");
        Ok(())
    }

    async fn clear(&self, name: &str) -> bool {
        match lock(&self.timers).remove(name) {
            Some(timer) => {
                timer.handle.abort();
                tracing::debug!(alarm = name, "alarm cleared");
                true
            }
            None => false,
        }
    }
}

impl Drop for TokioAlarms {
    fn drop(&mut self) {
        for (_, timer) in lock(&self.timers).drain() {
            timer.handle.abort();
        }
    }
}
