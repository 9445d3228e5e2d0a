use thiserror::Error;

use crate::domain::ItemId;
use crate::ports::{HostError, StoreError};

/// ErrorKind は呼び出し側に見せる分類
///
/// - Validation: 入力の問題（存在しない id など）。no-op で終わる
/// - Persistence: ストアの読み書き失敗。自動リトライはしない
/// - Host: タブ・アラーム操作の失敗
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Persistence,
    Host,
}

#[derive(Debug, Error)]
pub enum SnoozeError {
    #[error("no deferred item with id {0}")]
    NotFound(ItemId),

    #[error("tab cannot be restored later: {0}")]
    Unrestorable(String),

    #[error(transparent)]
    Persistence(#[from] StoreError),

    #[error(transparent)]
    Host(#[from] HostError),
}

impl SnoozeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SnoozeError::NotFound(_) | SnoozeError::Unrestorable(_) => ErrorKind::Validation,
            SnoozeError::Persistence(_) => ErrorKind::Persistence,
            SnoozeError::Host(_) => ErrorKind::Host,
        }
    }
}
