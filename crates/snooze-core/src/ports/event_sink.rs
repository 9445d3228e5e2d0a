//! EventSink port - イベント記録の抽象化
//!
//! # 実装
//! - TracingEventSink: tracing のログとして出す（既定）
//! - RecordingEventSink: テスト用に溜める

use crate::domain::DomainEvent;

/// EventSink はドメインイベントを記録
///
/// 記録の失敗で状態遷移を止めないよう、戻り値は持たない。
pub trait EventSink: Send + Sync {
    fn emit(&self, event: DomainEvent);
}
