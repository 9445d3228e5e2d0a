//! SchedulingService - 延期・起床・変更・取消のオーケストレーション
//!
//! # 状態遷移
//! ```text
//! Active ──submit──▶ Deferred ──wake──▶ Restored
//!                      │  ▲
//!                      │  └─reschedule
//!                      └────cancel────▶ Cancelled
//! ```
//!
//! # 設計原則
//! - ストアが正本。アラームは合図でしかない
//! - ハンドラは 1 つずつ実行する（サービス全体のゲートで直列化）
//! - 起床は get → remove → disarm → タブ作成。タブ作成に失敗してもレコードは戻さない
//!   （同じアイテムが二度開くより、一度も開かない方を選ぶ）
//! - submit はレコード永続化とアラーム登録の両方が成功して初めて元タブを閉じる
//!
//! # 学習ポイント
//! - `tokio::sync::Mutex<()>` をゲートとして使い、await をまたいで排他する
//! - `Deferral` を網羅的に match して、indefinite の扱いを型で強制する

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::domain::{
    remaining, Deferral, DeferralOption, DeferredItem, DomainEvent, ItemId, SourceRef,
    TimeRemaining,
};
use crate::error::SnoozeError;
use crate::ports::{Clock, EventSink, HostError, IdGenerator, TabHost};

use super::config::ServiceConfig;
use super::item_store::DeferredItemStore;
use super::wake_scheduler::{item_for_alarm, WakeScheduler};

/// Result of a wake attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WakeOutcome {
    /// Record removed and a tab opened.
    Restored(SourceRef),
    /// No record with this id (already woken, cancelled, or not ours).
    AlreadyHandled,
    /// Record removed, but the host could not open the tab.
    RestoreFailed(HostError),
    /// Alarm for a record that is no longer due (rescheduled while the
    /// signal was in flight). The record is kept.
    Stale,
}

/// Summary of a recovery sweep.
#[derive(Debug, Default)]
pub struct RecoveryReport {
    pub restored: Vec<ItemId>,
    pub rearmed: Vec<ItemId>,
    pub failures: Vec<(ItemId, SnoozeError)>,
}

impl RecoveryReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A record plus its display fields, as returned by list requests.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    #[serde(flatten)]
    pub item: DeferredItem,
    pub remaining: TimeRemaining,
    pub wake_label: String,
    pub option_label: &'static str,
}

pub struct SchedulingService {
    store: DeferredItemStore,
    scheduler: WakeScheduler,
    tabs: Arc<dyn TabHost>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    events: Arc<dyn EventSink>,
    config: ServiceConfig,
    gate: Mutex<()>,
}

impl SchedulingService {
    pub fn new(
        store: DeferredItemStore,
        scheduler: WakeScheduler,
        tabs: Arc<dyn TabHost>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        events: Arc<dyn EventSink>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            scheduler,
            tabs,
            clock,
            ids,
            events,
            config,
            gate: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn store(&self) -> &DeferredItemStore {
        &self.store
    }

    pub fn scheduler(&self) -> &WakeScheduler {
        &self.scheduler
    }

    /// Resolve `option` against the current time in the configured zone.
    pub fn resolve(&self, option: DeferralOption) -> Deferral {
        self.config.zone.resolve(option, self.clock.now())
    }

    async fn arm(&self, item: &DeferredItem) -> Result<(), HostError> {
        match item.deferral() {
            Deferral::Scheduled { wake_at } => self.scheduler.arm(&item.id, wake_at).await,
            Deferral::Unscheduled => Ok(()),
        }
    }

    /// Defer a live tab: snapshot it, persist the record, arm the wake-up,
    /// then close the source tab.
    ///
    /// On any error before the source is closed, no record is left behind
    /// and the source tab stays open.
    pub async fn submit(
        &self,
        source: SourceRef,
        option: DeferralOption,
    ) -> Result<DeferredItem, SnoozeError> {
        let _gate = self.gate.lock().await;

        let tab = self.tabs.get(source).await?;
        if !tab.payload.is_restorable() {
            return Err(SnoozeError::Unrestorable(tab.payload.url));
        }

        let now = self.clock.now();
        let deferral = self.config.zone.resolve(option, now);
        let item = DeferredItem::new(
            self.ids.generate_item_id(source),
            source,
            tab.payload,
            option,
            now,
            deferral,
        )
        .with_owner(tab.window_id);

        self.store.put(item.clone()).await?;

        if let Err(err) = self.arm(&item).await {
            if let Err(undo) = self.store.remove(&item.id).await {
                tracing::error!(item_id = %item.id, error = %undo, "could not drop record after failed arm");
            }
            return Err(err.into());
        }

        if let Err(err) = self.tabs.remove(source).await {
            tracing::warn!(item_id = %item.id, tab = %source, error = %err, "deferred tab could not be closed");
        }

        self.events.emit(DomainEvent::Deferred {
            item_id: item.id.clone(),
            title: item.payload.title.clone(),
            deferral,
        });
        Ok(item)
    }

    /// Wake an item: remove its record, disarm it, and open its tab.
    ///
    /// A missing record is not an error; the wake was already handled.
    pub async fn wake(&self, id: &ItemId) -> Result<WakeOutcome, SnoozeError> {
        let _gate = self.gate.lock().await;
        self.wake_locked(id).await
    }

    async fn wake_locked(&self, id: &ItemId) -> Result<WakeOutcome, SnoozeError> {
        let Some(item) = self.store.get(id).await? else {
            self.scheduler.disarm(id).await;
            tracing::debug!(item_id = %id, "wake for unknown item ignored");
            return Ok(WakeOutcome::AlreadyHandled);
        };

        self.store.remove(id).await?;
        self.scheduler.disarm(id).await;

        match self.tabs.create(&item.payload, item.owner_context).await {
            Ok(tab) => {
                self.events.emit(DomainEvent::Restored {
                    item_id: item.id,
                    tab,
                });
                Ok(WakeOutcome::Restored(tab))
            }
            Err(err) => {
                self.events.emit(DomainEvent::RestoreFailed {
                    item_id: item.id,
                    reason: err.to_string(),
                });
                Ok(WakeOutcome::RestoreFailed(err))
            }
        }
    }

    /// Wake on request ("restore now"). Unlike [`wake`](Self::wake), an
    /// unknown id is reported as `NotFound`.
    pub async fn wake_now(&self, id: &ItemId) -> Result<SourceRef, SnoozeError> {
        match self.wake(id).await? {
            WakeOutcome::Restored(tab) => Ok(tab),
            WakeOutcome::AlreadyHandled | WakeOutcome::Stale => {
                Err(SnoozeError::NotFound(id.clone()))
            }
            WakeOutcome::RestoreFailed(err) => Err(err.into()),
        }
    }

    /// Handle a fired alarm by name. Alarms that are not wake alarms are ignored.
    ///
    /// A fire for a record that is not due yet is stale: the record was
    /// rescheduled after the signal left the host, and its new alarm stays armed.
    pub async fn on_alarm(&self, name: &str) -> Result<WakeOutcome, SnoozeError> {
        let Some(id) = item_for_alarm(name) else {
            tracing::debug!(alarm = name, "ignoring alarm that is not a wake alarm");
            return Ok(WakeOutcome::AlreadyHandled);
        };

        let _gate = self.gate.lock().await;
        if let Some(item) = self.store.get(&id).await? {
            if !item.is_due(self.clock.now()) {
                tracing::debug!(item_id = %id, "stale wake alarm ignored");
                return Ok(WakeOutcome::Stale);
            }
        }
        self.wake_locked(&id).await
    }

    /// Re-resolve an item against a new option, keeping its id and payload.
    pub async fn reschedule(
        &self,
        id: &ItemId,
        option: DeferralOption,
    ) -> Result<DeferredItem, SnoozeError> {
        let _gate = self.gate.lock().await;

        let mut item = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| SnoozeError::NotFound(id.clone()))?;

        let previous = item.deferral();
        let current = self.config.zone.resolve(option, self.clock.now());
        item.reschedule(option, current);
        self.store.put(item.clone()).await?;

        // The old wake must be gone even if re-arming fails; an unarmed
        // record is picked up by the next recovery sweep.
        self.scheduler.disarm(id).await;
        if let Deferral::Scheduled { wake_at } = current {
            self.scheduler.arm(id, wake_at).await?;
        }

        self.events.emit(DomainEvent::Rescheduled {
            item_id: id.clone(),
            previous,
            current,
        });
        Ok(item)
    }

    /// Drop an item without restoring it.
    pub async fn cancel(&self, id: &ItemId) -> Result<DeferredItem, SnoozeError> {
        let _gate = self.gate.lock().await;

        let item = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| SnoozeError::NotFound(id.clone()))?;

        self.store.remove(id).await?;
        self.scheduler.disarm(id).await;

        self.events.emit(DomainEvent::Cancelled {
            item_id: id.clone(),
        });
        Ok(item)
    }

    /// Drop every item. Returns how many were removed.
    pub async fn cancel_all(&self) -> Result<usize, SnoozeError> {
        let _gate = self.gate.lock().await;

        let removed = self.store.remove_all().await?;
        for item in &removed {
            self.scheduler.disarm(&item.id).await;
            self.events.emit(DomainEvent::Cancelled {
                item_id: item.id.clone(),
            });
        }
        Ok(removed.len())
    }

    /// Every record, earliest wake first; indefinite items last.
    pub async fn list(&self) -> Result<Vec<DeferredItem>, SnoozeError> {
        let mut items = self.store.list().await?;
        items.sort_by(|a, b| {
            (a.deferral_option.is_indefinite(), a.wake_at)
                .cmp(&(b.deferral_option.is_indefinite(), b.wake_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(items)
    }

    /// [`list`](Self::list) with display fields relative to now.
    pub async fn views(&self) -> Result<Vec<ItemView>, SnoozeError> {
        let now = self.clock.now();
        let items = self.list().await?;
        Ok(items
            .into_iter()
            .map(|item| {
                let deferral = item.deferral();
                ItemView {
                    remaining: remaining(deferral, now),
                    wake_label: self.config.zone.wake_label(deferral, now),
                    option_label: item.deferral_option.label(),
                    item,
                }
            })
            .collect())
    }

    pub async fn export(&self) -> Result<String, SnoozeError> {
        Ok(self.store.export().await?)
    }

    /// Merge exported records and arm the scheduled ones. Records already
    /// due are armed in the past and wake as soon as the host fires them.
    pub async fn import(&self, json: &str) -> Result<usize, SnoozeError> {
        let _gate = self.gate.lock().await;

        let added = self.store.import(json).await?;
        for item in &added {
            if let Err(err) = self.arm(item).await {
                tracing::warn!(item_id = %item.id, error = %err, "imported item could not be armed; recovery will retry");
            }
        }
        tracing::info!(imported = added.len(), "records imported");
        Ok(added.len())
    }

    /// Startup sweep: wake everything already due and re-arm the rest.
    ///
    /// Per-item failures are collected and do not stop the sweep.
    pub async fn recover(&self) -> Result<RecoveryReport, SnoozeError> {
        let _gate = self.gate.lock().await;

        let now = self.clock.now();
        let items = self.store.list().await?;
        let mut report = RecoveryReport::default();

        for item in items {
            match item.deferral() {
                Deferral::Scheduled { wake_at } if wake_at <= now => {
                    match self.wake_locked(&item.id).await {
                        Ok(WakeOutcome::Restored(_)) => report.restored.push(item.id),
                        Ok(WakeOutcome::AlreadyHandled | WakeOutcome::Stale) => {}
                        Ok(WakeOutcome::RestoreFailed(err)) => {
                            report.failures.push((item.id, err.into()))
                        }
                        Err(err) => report.failures.push((item.id, err)),
                    }
                }
                Deferral::Scheduled { wake_at } => {
                    match self.scheduler.arm(&item.id, wake_at).await {
                        Ok(()) => report.rearmed.push(item.id),
                        Err(err) => report.failures.push((item.id, err.into())),
                    }
                }
                Deferral::Unscheduled => {}
            }
        }

        for (item_id, err) in &report.failures {
            tracing::warn!(%item_id, error = %err, "recovery could not handle item");
        }
        tracing::debug!(armed = self.scheduler.armed_count(), "wakes armed after recovery");
        self.events.emit(DomainEvent::Recovered {
            at: now,
            restored: report.restored.len(),
            rearmed: report.rearmed.len(),
            failed: report.failures.len(),
        });
        Ok(report)
    }
}
