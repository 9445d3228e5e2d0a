//! AppBuilder - SchedulingService の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 開発体験の改善（明確なエラーメッセージ）

use std::sync::Arc;

use crate::impls::TracingEventSink;
use crate::ports::{AlarmHost, Clock, EventSink, IdGenerator, KvStore, SystemClock, TabHost, UlidGenerator};

use super::config::{ServiceConfig, Zone};
use super::item_store::DeferredItemStore;
use super::service::SchedulingService;
use super::wake_scheduler::WakeScheduler;

/// AppBuilder はホスト側の port を受け取って SchedulingService を組み立てる
///
/// # 使用例
/// ```ignore
/// let service = AppBuilder::new()
///     .kv_store(Arc::new(FileKvStore::new(dir)))
///     .alarm_host(Arc::new(alarms))
///     .tab_host(Arc::new(InMemoryTabs::new()))
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - KvStore / AlarmHost / TabHost は必須。既定値はない
/// - Clock / IdGenerator / EventSink は省略するとシステム時計・ULID・tracing
/// - 不足があれば build() が BuildError を返す
#[derive(Default)]
pub struct AppBuilder {
    kv: Option<Arc<dyn KvStore>>,
    alarms: Option<Arc<dyn AlarmHost>>,
    tabs: Option<Arc<dyn TabHost>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    events: Option<Arc<dyn EventSink>>,
    config: ServiceConfig,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing ports: {0:?}. These must be provided before build().")]
    MissingPorts(Vec<&'static str>),

    #[error("Invalid storage key {0:?}: use letters, digits, '_' or '-'.")]
    InvalidStorageKey(String),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kv_store(mut self, kv: Arc<dyn KvStore>) -> Self {
        self.kv = Some(kv);
        self
    }

    pub fn alarm_host(mut self, alarms: Arc<dyn AlarmHost>) -> Self {
        self.alarms = Some(alarms);
        self
    }

    pub fn tab_host(mut self, tabs: Arc<dyn TabHost>) -> Self {
        self.tabs = Some(tabs);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn zone(mut self, zone: Zone) -> Self {
        self.config.zone = zone;
        self
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.config.storage_key = key.into();
        self
    }

    /// 検証してから SchedulingService を生成
    ///
    /// # 検証
    /// - 必須 port が全て設定されているか（不足は全部まとめて報告）
    /// - storage key が空でなく、使える文字だけか
    pub fn build(self) -> Result<SchedulingService, BuildError> {
        let mut missing = Vec::new();
        if self.kv.is_none() {
            missing.push("kv_store");
        }
        if self.alarms.is_none() {
            missing.push("alarm_host");
        }
        if self.tabs.is_none() {
            missing.push("tab_host");
        }
        let (Some(kv), Some(alarms), Some(tabs)) = (self.kv, self.alarms, self.tabs) else {
            return Err(BuildError::MissingPorts(missing));
        };

        let key = &self.config.storage_key;
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(BuildError::InvalidStorageKey(key.clone()));
        }

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let ids = self.ids.unwrap_or_else(|| {
            Arc::new(UlidGenerator::new(clock.clone())) as Arc<dyn IdGenerator>
        });
        let events = self
            .events
            .unwrap_or_else(|| Arc::new(TracingEventSink) as Arc<dyn EventSink>);

        tracing::debug!(zone = %self.config.zone, key = %self.config.storage_key, "scheduling service built");

        Ok(SchedulingService::new(
            DeferredItemStore::new(kv, self.config.storage_key.clone()),
            WakeScheduler::new(alarms),
            tabs,
            clock,
            ids,
            events,
            self.config,
        ))
    }
}
