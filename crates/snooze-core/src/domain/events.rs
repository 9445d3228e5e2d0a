//! Events - ドメインイベント
//!
//! SchedulingService は状態遷移のたびに DomainEvent を EventSink へ送る。

use chrono::{DateTime, Utc};

use super::ids::{ItemId, SourceRef};
use super::item::Deferral;
use super::state::ItemState;

/// DomainEvent はドメインで発生したイベント
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// Source tab snapshotted, record persisted, source closed.
    Deferred {
        item_id: ItemId,
        title: String,
        deferral: Deferral,
    },

    /// Wake instant replaced in place.
    Rescheduled {
        item_id: ItemId,
        previous: Deferral,
        current: Deferral,
    },

    /// Record removed and a new tab opened.
    Restored { item_id: ItemId, tab: SourceRef },

    /// Record removed but the host failed to open the tab.
    RestoreFailed { item_id: ItemId, reason: String },

    /// Record removed without restoring.
    Cancelled { item_id: ItemId },

    /// Recovery sweep finished.
    Recovered {
        at: DateTime<Utc>,
        restored: usize,
        rearmed: usize,
        failed: usize,
    },
}

impl DomainEvent {
    pub fn item_id(&self) -> Option<&ItemId> {
        match self {
            DomainEvent::Deferred { item_id, .. }
            | DomainEvent::Rescheduled { item_id, .. }
            | DomainEvent::Restored { item_id, .. }
            | DomainEvent::RestoreFailed { item_id, .. }
            | DomainEvent::Cancelled { item_id } => Some(item_id),
            DomainEvent::Recovered { .. } => None,
        }
    }

    /// (from, to) for events that move an item between states.
    ///
    /// A failed restore still ends in `Restored`: the record is gone and
    /// the item will not be woken again.
    pub fn transition(&self) -> Option<(ItemState, ItemState)> {
        match self {
            DomainEvent::Deferred { .. } => Some((ItemState::Active, ItemState::Deferred)),
            DomainEvent::Rescheduled { .. } => Some((ItemState::Deferred, ItemState::Deferred)),
            DomainEvent::Restored { .. } | DomainEvent::RestoreFailed { .. } => {
                Some((ItemState::Deferred, ItemState::Restored))
            }
            DomainEvent::Cancelled { .. } => Some((ItemState::Deferred, ItemState::Cancelled)),
            DomainEvent::Recovered { .. } => None,
        }
    }
}
