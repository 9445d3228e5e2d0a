//! TabHost port - ホストのタブライフサイクル操作
//!
//! タブは数値ハンドル（SourceRef）で指す。閉じたタブのハンドルは無効になる。

use async_trait::async_trait;

use crate::domain::{SourceRef, TabPayload, WindowId};

/// HostError はホスト（タブ・アラーム）操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("no tab with id {0}")]
    TabNotFound(SourceRef),

    #[error("host rejected the operation: {0}")]
    Rejected(String),
}

/// A live tab as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSnapshot {
    pub id: SourceRef,
    #[serde(flatten)]
    pub payload: TabPayload,
    #[serde(default)]
    pub window_id: Option<WindowId>,
}

/// TabHost はタブの取得・作成・削除
#[async_trait]
pub trait TabHost: Send + Sync {
    async fn get(&self, tab: SourceRef) -> Result<TabSnapshot, HostError>;

    /// Open a background tab. `window` is a placement hint only.
    async fn create(
        &self,
        payload: &TabPayload,
        window: Option<WindowId>,
    ) -> Result<SourceRef, HostError>;

    async fn remove(&self, tab: SourceRef) -> Result<(), HostError>;
}
