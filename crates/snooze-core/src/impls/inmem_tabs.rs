//! InMemoryTabs - ブラウザのタブを模したホスト
//!
//! テストと CLI のシミュレーションで使う。作成・削除の失敗を注入できる。

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::{SourceRef, TabPayload, WindowId};
use crate::ports::{HostError, TabHost, TabSnapshot};

/// Window used when a placement hint names a window that no longer exists.
pub const DEFAULT_WINDOW: u64 = 1;

struct TabsState {
    tabs: BTreeMap<SourceRef, TabSnapshot>,
    next_id: u64,
}

pub struct InMemoryTabs {
    state: Mutex<TabsState>,
    fail_create: AtomicBool,
    fail_remove: AtomicBool,
}

impl InMemoryTabs {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TabsState {
                tabs: BTreeMap::new(),
                next_id: 1,
            }),
            fail_create: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
        }
    }

    /// Seed with existing tabs. Later ids continue after the highest seeded one.
    pub fn with_tabs(tabs: impl IntoIterator<Item = TabSnapshot>) -> Self {
        let host = Self::new();
        {
            let mut state = host.lock();
            for tab in tabs {
                state.next_id = state.next_id.max(tab.id.get() + 1);
                state.tabs.insert(tab.id, tab);
            }
        }
        host
    }

    fn lock(&self) -> MutexGuard<'_, TabsState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Open a tab directly (what a user would do).
    pub fn open(&self, payload: TabPayload, window: WindowId) -> SourceRef {
        let mut state = self.lock();
        let id = SourceRef::new(state.next_id);
        state.next_id += 1;
        state.tabs.insert(
            id,
            TabSnapshot {
                id,
                payload,
                window_id: Some(window),
            },
        );
        id
    }

    pub fn tabs(&self) -> Vec<TabSnapshot> {
        self.lock().tabs.values().cloned().collect()
    }

    pub fn contains(&self, tab: SourceRef) -> bool {
        self.lock().tabs.contains_key(&tab)
    }

    pub fn len(&self) -> usize {
        self.lock().tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_remove(&self, fail: bool) {
        self.fail_remove.store(fail, Ordering::SeqCst);
    }
}

impl Default for InMemoryTabs {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TabHost for InMemoryTabs {
    async fn get(&self, tab: SourceRef) -> Result<TabSnapshot, HostError> {
        self.lock()
            .tabs
            .get(&tab)
            .cloned()
            .ok_or(HostError::TabNotFound(tab))
    }

    async fn create(
        &self,
        payload: &TabPayload,
        window: Option<WindowId>,
    ) -> Result<SourceRef, HostError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(HostError::Rejected(format!("cannot open {}", payload.url)));
        }

        let mut state = self.lock();
        let window = window
            .filter(|w| state.tabs.values().any(|t| t.window_id == Some(*w)))
            .unwrap_or(WindowId::new(DEFAULT_WINDOW));
        let id = SourceRef::new(state.next_id);
        state.next_id += 1;
        state.tabs.insert(
            id,
            TabSnapshot {
                id,
                payload: payload.clone(),
                window_id: Some(window),
            },
        );
        Ok(id)
    }

    async fn remove(&self, tab: SourceRef) -> Result<(), HostError> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(HostError::Rejected(format!("cannot close {tab}")));
        }
        self.lock()
            .tabs
            .remove(&tab)
            .map(|_| ())
            .ok_or(HostError::TabNotFound(tab))
    }
}
