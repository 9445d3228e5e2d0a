//! snooze-core
//!
//! Core of the tab snooze engine: defer a tab now, restore it later.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, option, item, rules, remaining, state, events）
//! - **ports**: 抽象化レイヤー（KvStore, AlarmHost, TabHost, Clock, IdGenerator, EventSink）
//! - **impls**: 実装（InMemoryKvStore, FileKvStore, TokioAlarms など）
//! - **app**: アプリケーションロジック（builder, item_store, wake_scheduler, service, protocol, event_loop）
//! - **error**: 呼び出し側に見せるエラー型

pub mod domain;
pub mod ports;
pub mod impls;
pub mod app;
pub mod error;

pub use error::{ErrorKind, SnoozeError};
