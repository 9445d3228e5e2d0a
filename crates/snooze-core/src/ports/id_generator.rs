//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）
//!
//! 形式は `snoozed_<ULID>_<source>`。ULID の timestamp 部分が投入時刻、
//! 末尾が元タブのハンドル。

use crate::domain::{ItemId, SourceRef};
use crate::ports::Clock;
use ulid::Ulid;

pub const ITEM_ID_PREFIX: &str = "snoozed_";

/// IdGenerator は延期レコードの ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数タスクから使える）
pub trait IdGenerator: Send + Sync {
    fn generate_item_id(&self, source: SourceRef) -> ItemId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って現在時刻ベースの ULID を生成します。
/// テスト時に FixedClock を使えば timestamp 部分が決定的になります。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_item_id(&self, source: SourceRef) -> ItemId {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        ItemId::new(format!("{ITEM_ID_PREFIX}{ulid}_{}", source.get()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    /// ID から ULID 部分を取り出す（自前で生成した ID のみ）
    fn parse_ulid(id: &ItemId) -> Option<Ulid> {
        let rest = id.as_str().strip_prefix(ITEM_ID_PREFIX)?;
        let (ulid, _source) = rest.split_once('_')?;
        Ulid::from_string(ulid).ok()
    }

    #[test]
    fn ulid_generator_generates_unique_ids() {
        let id_gen = UlidGenerator::new(SystemClock);
        let source = SourceRef::new(5);

        let id1 = id_gen.generate_item_id(source);
        let id2 = id_gen.generate_item_id(source);

        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with(ITEM_ID_PREFIX));
        assert!(id1.as_str().ends_with("_5"));
    }

    #[test]
    fn ulid_generator_with_fixed_clock_embeds_submission_time() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let id_gen = UlidGenerator::new(FixedClock::new(fixed_time));

        let id1 = id_gen.generate_item_id(SourceRef::new(1));
        let id2 = id_gen.generate_item_id(SourceRef::new(1));

        // ランダム部分があるので ID は異なる
        assert_ne!(id1, id2);

        // ただし timestamp 部分は同じ
        let ts1 = parse_ulid(&id1).unwrap().timestamp_ms();
        let ts2 = parse_ulid(&id2).unwrap().timestamp_ms();
        assert_eq!(ts1, ts2);
        assert_eq!(ts1, fixed_time.timestamp_millis() as u64);
    }

    #[test]
    fn foreign_ids_have_no_ulid() {
        assert!(parse_ulid(&ItemId::from("snoozed_1752753600000_42")).is_none());
        assert!(parse_ulid(&ItemId::from("anything")).is_none());
    }
}
