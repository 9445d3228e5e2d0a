//! WakeScheduler - アイテムごとのワンショット起床登録
//!
//! アラーム名は `wake_<item id>`。発火した名前から item id を逆引きできる。
//!
//! # 設計原則
//! - 同じ item の arm は置き換え（古い登録は残さない）
//! - disarm は冪等。登録がなくても安全
//! - 発火は AlarmHost 側のチャネルで届き、SchedulingService が処理する
//! - 登録は揮発的なもの。正本はストアで、起動時の回収スイープが補う

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::domain::ItemId;
use crate::ports::{AlarmHost, HostError};

pub const ALARM_PREFIX: &str = "wake_";

pub fn alarm_name(id: &ItemId) -> String {
    format!("{ALARM_PREFIX}{id}")
}

/// Item id for an alarm name, or `None` if the alarm is not ours.
pub fn item_for_alarm(name: &str) -> Option<ItemId> {
    name.strip_prefix(ALARM_PREFIX)
        .filter(|rest| !rest.is_empty())
        .map(ItemId::from)
}

pub struct WakeScheduler {
    alarms: Arc<dyn AlarmHost>,
    armed: Mutex<HashMap<ItemId, DateTime<Utc>>>,
}

impl WakeScheduler {
    pub fn new(alarms: Arc<dyn AlarmHost>) -> Self {
        Self {
            alarms,
            armed: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ItemId, DateTime<Utc>>> {
        self.armed.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register (or replace) the wake-up for `id`. A past instant fires as
    /// soon as the host can deliver it.
    pub async fn arm(&self, id: &ItemId, wake_at: DateTime<Utc>) -> Result<(), HostError> {
        self.alarms.create(&alarm_name(id), wake_at).await?;
        self.lock().insert(id.clone(), wake_at);
        tracing::debug!(item_id = %id, %wake_at, "wake armed");
        Ok(())
    }

    /// Cancel the wake-up for `id`. Returns whether the host still had one pending.
    pub async fn disarm(&self, id: &ItemId) -> bool {
        self.lock().remove(id);
        let cleared = self.alarms.clear(&alarm_name(id)).await;
        if cleared {
            tracing::debug!(item_id = %id, "wake disarmed");
        }
        cleared
    }

    pub fn armed_count(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::ManualAlarms;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 17, hour, 0, 0).unwrap()
    }

    #[test]
    fn alarm_names_round_trip() {
        let id = ItemId::from("snoozed_01J_4");
        assert_eq!(alarm_name(&id), "wake_snoozed_01J_4");
        assert_eq!(item_for_alarm(&alarm_name(&id)), Some(id));
        assert_eq!(item_for_alarm("backup"), None);
        assert_eq!(item_for_alarm("wake_"), None);
    }

    #[tokio::test]
    async fn arming_twice_replaces() {
        let alarms = Arc::new(ManualAlarms::new());
        let scheduler = WakeScheduler::new(alarms.clone());
        let id = ItemId::from("a");

        scheduler.arm(&id, at(15)).await.unwrap();
        scheduler.arm(&id, at(18)).await.unwrap();

        assert_eq!(alarms.pending().len(), 1);
        assert_eq!(alarms.when("wake_a"), Some(at(18)));
        assert_eq!(scheduler.armed_count(), 1);
    }

    #[tokio::test]
    async fn disarm_is_idempotent() {
        let alarms = Arc::new(ManualAlarms::new());
        let scheduler = WakeScheduler::new(alarms.clone());
        let id = ItemId::from("a");

        scheduler.arm(&id, at(15)).await.unwrap();
        assert!(scheduler.disarm(&id).await);
        assert!(!scheduler.disarm(&id).await);
        assert_eq!(scheduler.armed_count(), 0);
        assert!(alarms.pending().is_empty());
    }

    #[tokio::test]
    async fn failed_arm_records_nothing() {
        let alarms = Arc::new(ManualAlarms::new());
        alarms.fail_creates(true);
        let scheduler = WakeScheduler::new(alarms.clone());

        assert!(scheduler.arm(&ItemId::from("a"), at(15)).await.is_err());
        assert_eq!(scheduler.armed_count(), 0);
    }
}
