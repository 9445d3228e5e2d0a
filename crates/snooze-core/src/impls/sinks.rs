//! EventSink の実装

use std::sync::Mutex;

use crate::domain::DomainEvent;
use crate::ports::EventSink;

/// DomainEvent を tracing のログに出す（既定の sink）
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: DomainEvent) {
        if let Some((from, to)) = event.transition() {
            tracing::debug!(
                item_id = ?event.item_id(),
                ?from,
                ?to,
                persisted = to.is_persisted(),
                terminal = to.is_terminal(),
                "item state changed"
            );
        }
        match &event {
            DomainEvent::Deferred {
                item_id,
                title,
                deferral,
            } => match deferral.wake_at() {
                Some(wake_at) => tracing::info!(%item_id, title = %title, %wake_at, "tab deferred"),
                None => tracing::info!(%item_id, title = %title, "tab deferred indefinitely"),
            },
            DomainEvent::Rescheduled {
                item_id, current, ..
            } => match current.wake_at() {
                Some(wake_at) => tracing::info!(%item_id, %wake_at, "deferral rescheduled"),
                None => tracing::info!(%item_id, "deferral rescheduled indefinitely"),
            },
            DomainEvent::Restored { item_id, tab } => {
                tracing::info!(%item_id, %tab, "tab restored")
            }
            DomainEvent::RestoreFailed { item_id, reason } => {
                tracing::warn!(%item_id, reason = %reason, "tab restore failed, record dropped")
            }
            DomainEvent::Cancelled { item_id } => tracing::info!(%item_id, "deferral cancelled"),
            DomainEvent::Recovered {
                at,
                restored,
                rearmed,
                failed,
            } => tracing::info!(%at, restored, rearmed, failed, "recovery sweep finished"),
        }
    }
}

/// テスト用: 受け取ったイベントを溜める
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: DomainEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}
