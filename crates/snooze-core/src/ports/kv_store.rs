//! KvStore port - ホストの永続 key-value ストア
//!
//! 単一キーの read / write はアトミック。キーをまたぐトランザクションはない。
//!
//! # 実装
//! - **InMemoryKvStore**: テスト用（書き込み失敗の注入が可能）
//! - **FileKvStore**: 1 キー = 1 JSON ファイル、tmp + rename で書き込み

use async_trait::async_trait;
use serde_json::Value;

/// StoreError は永続化層のエラー
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value is not valid: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("stored collection has version {found}, newest supported is {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// KvStore はホストの key-value ストア
///
/// # 設計原則
/// - 値は構造化データ（JSON）
/// - キャッシュしない: 読むたびにバックエンドへ行く
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}
