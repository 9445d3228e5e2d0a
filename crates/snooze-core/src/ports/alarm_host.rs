//! AlarmHost port - ホストのワンショットアラーム
//!
//! アラームは文字列の名前で識別する。発火はアラームを作った呼び出しとは
//! 別経路（非同期）で届く。発火通知の受け口は実装ごとに持つ。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::tab_host::HostError;

/// AlarmHost はホストのタイマー機構
///
/// # 設計原則
/// - 同じ名前で create すると置き換え
/// - clear は存在しない名前・発火済みの名前に対しても安全（false を返すだけ）
#[async_trait]
pub trait AlarmHost: Send + Sync {
    async fn create(&self, name: &str, when: DateTime<Utc>) -> Result<(), HostError>;

    /// Returns whether an alarm with this name was pending.
    async fn clear(&self, name: &str) -> bool;
}
