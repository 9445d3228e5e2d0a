//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait はホスト環境（ブラウザのタブ、アラーム、key-value ストア）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - key-value ストアが source of truth（正本）
//! - アラームは「起こす合図」に過ぎない。起動時の回収スイープで取りこぼしを拾う
//! - 時刻と ID 生成も port にして、テストで決定的にする

pub mod kv_store;
pub mod alarm_host;
pub mod tab_host;
pub mod clock;
pub mod id_generator;
pub mod event_sink;

// 主要な trait を再エクスポート
pub use self::kv_store::{KvStore, StoreError};
pub use self::alarm_host::AlarmHost;
pub use self::tab_host::{HostError, TabHost, TabSnapshot};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::event_sink::EventSink;
