//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: port のワイヤリングと起動時検証
//! - **DeferredItemStore**: 保留レコードの永続コレクション（バージョン付き）
//! - **WakeScheduler**: アイテムごとの起床アラーム
//! - **SchedulingService**: submit / wake / reschedule / cancel / recover
//! - **Protocol**: JSON のリクエスト / レスポンス
//! - **EventLoop**: 発火とリクエストを 1 つずつ処理するループ

pub mod builder;
pub mod config;
pub mod item_store;
pub mod wake_scheduler;
pub mod service;
pub mod protocol;
pub mod event_loop;

// 主要な型を再エクスポート
pub use self::builder::{AppBuilder, BuildError};
pub use self::config::{ConfigError, ServiceConfig, Zone};
pub use self::item_store::DeferredItemStore;
pub use self::wake_scheduler::WakeScheduler;
pub use self::service::{ItemView, RecoveryReport, SchedulingService, WakeOutcome};
pub use self::protocol::{Request, Response};
pub use self::event_loop::{EventLoop, LoopClient};
