//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryKvStore** / **FileKvStore**: key-value ストア
//! - **TokioAlarms**: tokio タイマーによるアラーム（本番用）
//! - **ManualAlarms**: 手動で発火させるアラーム（テスト用）
//! - **InMemoryTabs**: タブホストのシミュレーション
//! - **TracingEventSink** / **RecordingEventSink**: イベント記録

pub mod inmem_kv;
pub mod file_kv;
pub mod tokio_alarms;
pub mod manual_alarms;
pub mod inmem_tabs;
pub mod sinks;

// 主要な型を再エクスポート
pub use self::inmem_kv::InMemoryKvStore;
pub use self::file_kv::FileKvStore;
pub use self::tokio_alarms::TokioAlarms;
pub use self::manual_alarms::ManualAlarms;
pub use self::inmem_tabs::InMemoryTabs;
pub use self::sinks::{RecordingEventSink, TracingEventSink};
