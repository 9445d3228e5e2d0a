//! State - 延期アイテムのライフサイクル
//!
//! ```text
//! Active ──submit──▶ Deferred ──wake────▶ Restored
//!                      │  ▲   └──cancel──▶ Cancelled
//!                      └──┘ reschedule
//! ```
//!
//! Restored / Cancelled はどちらもレコード削除で終わる。違いはタブを
//! 作り直すかどうかだけ。

use serde::{Deserialize, Serialize};

/// ItemState はアイテムの状態を表現
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// Live tab, not in the store.
    Active,

    /// Persisted, and armed unless indefinite.
    Deferred,

    /// Record removed and payload materialized as a new tab.
    Restored,

    /// Record removed without materializing.
    Cancelled,
}

impl ItemState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, ItemState::Restored | ItemState::Cancelled)
    }

    /// Whether a record for the item exists in the store.
    pub fn is_persisted(self) -> bool {
        matches!(self, ItemState::Deferred)
    }
}
