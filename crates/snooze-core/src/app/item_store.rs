//! DeferredItemStore - 保留レコードの永続コレクション
//!
//! すべてのレコードを 1 つのキーの下に、バージョン付きの JSON として置く:
//!
//! ```json
//! { "version": 1, "items": [ { "id": "snoozed_…", ... } ] }
//! ```
//!
//! # 設計原則
//! - 毎回ストアから読む（キャッシュしない）。ストアが正本
//! - 変更は read → modify → write。単一キー書き込みのアトミック性に頼る
//! - バージョンなしの配列（旧形式）は version 0 として読み、次の書き込みで移行する
//! - 自分より新しい version は読まずに `UnsupportedVersion` を返す
//!
//! # 学習ポイント
//! - serde の `#[serde(with = ...)]` でエポックミリ秒を扱う
//! - 旧形式を別の struct で受けて `From` で変換する

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    Deferral, DeferralOption, DeferredItem, ItemId, SourceRef, TabPayload, WindowId,
};
use crate::ports::{KvStore, StoreError};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Collection {
    version: u32,
    items: Vec<DeferredItem>,
}

/// Record shape written before the collection was versioned.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyItem {
    id: ItemId,
    original_tab_id: SourceRef,
    url: String,
    title: String,
    #[serde(default)]
    fav_icon_url: Option<String>,
    snooze_option: DeferralOption,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    snoozed_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    unsnooze_at: DateTime<Utc>,
    #[serde(default)]
    window_id: Option<WindowId>,
}

impl From<LegacyItem> for DeferredItem {
    fn from(legacy: LegacyItem) -> Self {
        let deferral = if legacy.snooze_option.is_indefinite() {
            Deferral::Unscheduled
        } else {
            Deferral::Scheduled {
                wake_at: legacy.unsnooze_at,
            }
        };
        let payload = TabPayload {
            url: legacy.url,
            title: legacy.title,
            fav_icon_url: legacy.fav_icon_url,
        };
        DeferredItem::new(
            legacy.id,
            legacy.original_tab_id,
            payload,
            legacy.snooze_option,
            legacy.snoozed_at,
            deferral,
        )
        .with_owner(legacy.window_id)
    }
}

/// Decode one record in either the current or the legacy shape.
fn decode_item(value: Value) -> Option<DeferredItem> {
    match serde_json::from_value::<DeferredItem>(value.clone()) {
        Ok(item) => Some(item),
        Err(_) => serde_json::from_value::<LegacyItem>(value)
            .ok()
            .map(DeferredItem::from),
    }
}

fn decode(value: Option<Value>) -> Result<Vec<DeferredItem>, StoreError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };

    if let Value::Array(_) = value {
        let legacy: Vec<LegacyItem> = serde_json::from_value(value)?;
        return Ok(legacy.into_iter().map(DeferredItem::from).collect());
    }

    if let Some(found) = value.get("version").and_then(Value::as_u64) {
        if found > u64::from(SCHEMA_VERSION) {
            return Err(StoreError::UnsupportedVersion {
                found: u32::try_from(found).unwrap_or(u32::MAX),
                supported: SCHEMA_VERSION,
            });
        }
    }

    let collection: Collection = serde_json::from_value(value)?;
    Ok(collection.items)
}

/// DeferredItemStore は KvStore の 1 キーに載ったレコード集合
pub struct DeferredItemStore {
    kv: Arc<dyn KvStore>,
    key: String,
}

impl DeferredItemStore {
    pub fn new(kv: Arc<dyn KvStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    async fn read(&self) -> Result<Vec<DeferredItem>, StoreError> {
        decode(self.kv.get(&self.key).await?)
    }

    async fn write(&self, items: Vec<DeferredItem>) -> Result<(), StoreError> {
        let value = serde_json::to_value(Collection {
            version: SCHEMA_VERSION,
            items,
        })?;
        self.kv.set(&self.key, value).await
    }

    /// All records. An absent value is an empty collection.
    pub async fn list(&self) -> Result<Vec<DeferredItem>, StoreError> {
        self.read().await
    }

    pub async fn get(&self, id: &ItemId) -> Result<Option<DeferredItem>, StoreError> {
        Ok(self.read().await?.into_iter().find(|item| &item.id == id))
    }

    /// Insert, or replace the record with the same id.
    pub async fn put(&self, item: DeferredItem) -> Result<(), StoreError> {
        let mut items = self.read().await?;
        match items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }
        self.write(items).await
    }

    /// Returns whether a record was removed. Absent ids do not write.
    pub async fn remove(&self, id: &ItemId) -> Result<bool, StoreError> {
        let mut items = self.read().await?;
        let before = items.len();
        items.retain(|item| &item.id != id);
        if items.len() == before {
            return Ok(false);
        }
        self.write(items).await?;
        Ok(true)
    }

    /// Remove everything; returns the removed records.
    pub async fn remove_all(&self) -> Result<Vec<DeferredItem>, StoreError> {
        let items = self.read().await?;
        self.write(Vec::new()).await?;
        Ok(items)
    }

    pub async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.read().await?.len())
    }

    /// Scheduled records whose wake instant is at or before `now`.
    pub async fn overdue(&self, now: DateTime<Utc>) -> Result<Vec<DeferredItem>, StoreError> {
        let mut items = self.read().await?;
        items.retain(|item| item.is_due(now));
        Ok(items)
    }

    /// Scheduled records waking in `[start, end)`.
    pub async fn in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DeferredItem>, StoreError> {
        let mut items = self.read().await?;
        items.retain(|item| {
            item.deferral()
                .wake_at()
                .is_some_and(|at| start <= at && at < end)
        });
        Ok(items)
    }

    /// Pretty-printed JSON array of every record.
    pub async fn export(&self) -> Result<String, StoreError> {
        let items = self.read().await?;
        Ok(serde_json::to_string_pretty(&items)?)
    }

    /// Merge records from an exported array (or a stored collection).
    ///
    /// Records whose id already exists, or with an empty id, url or title,
    /// are skipped. Returns the records that were added.
    pub async fn import(&self, json: &str) -> Result<Vec<DeferredItem>, StoreError> {
        let incoming: Vec<DeferredItem> = match serde_json::from_str::<Value>(json)? {
            Value::Array(values) => values.into_iter().filter_map(decode_item).collect(),
            other => decode(Some(other))?,
        };

        let mut items = self.read().await?;
        let mut known: HashSet<ItemId> = items.iter().map(|item| item.id.clone()).collect();
        let mut added = Vec::new();

        for item in incoming {
            if item.id.is_empty() || item.payload.url.is_empty() || item.payload.title.is_empty() {
                tracing::debug!(item_id = %item.id, "skipping incomplete record on import");
                continue;
            }
            if !known.insert(item.id.clone()) {
                continue;
            }
            added.push(item);
        }

        if !added.is_empty() {
            items.extend(added.iter().cloned());
            self.write(items).await?;
        }
        Ok(added)
    }
}
