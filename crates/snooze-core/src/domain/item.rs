//! DeferredItem: the persisted record of a deferred tab.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ItemId, SourceRef, WindowId};
use super::option::DeferralOption;

/// Wake instant stored for indefinite items: 2099-12-31T00:00:00Z.
pub const INDEFINITE_WAKE_MS: i64 = 4_102_358_400_000;

/// URL schemes the host refuses to re-open.
const PRIVILEGED_PREFIXES: [&str; 4] = ["chrome://", "chrome-extension://", "edge://", "about:"];

pub fn indefinite_sentinel() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(INDEFINITE_WAKE_MS).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Outcome of resolving a deferral option.
///
/// Call sites match on this instead of comparing the option against
/// "indefinite" by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferral {
    Scheduled { wake_at: DateTime<Utc> },
    Unscheduled,
}

impl Deferral {
    pub fn wake_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Deferral::Scheduled { wake_at } => Some(*wake_at),
            Deferral::Unscheduled => None,
        }
    }

    /// The instant written to storage; the sentinel for `Unscheduled`.
    pub fn persisted_wake_at(&self) -> DateTime<Utc> {
        self.wake_at().unwrap_or_else(indefinite_sentinel)
    }

    /// Unscheduled deferrals are never due.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self {
            Deferral::Scheduled { wake_at } => *wake_at <= now,
            Deferral::Unscheduled => false,
        }
    }
}

/// Display/restoration data snapshotted from the source tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabPayload {
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
}

impl TabPayload {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            fav_icon_url: None,
        }
    }

    /// Whether the host can open this URL again later.
    pub fn is_restorable(&self) -> bool {
        let url = self.url.trim();
        !url.is_empty() && !PRIVILEGED_PREFIXES.iter().any(|p| url.starts_with(p))
    }
}

/// The persisted entity.
///
/// # 不変条件
/// - `id` はライブなレコード間で一意（put は同じ id を上書き）
/// - indefinite 以外は `wake_at >= submitted_at`
/// - indefinite の `wake_at` はセンチネル値で、自動復元の対象にならない
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeferredItem {
    pub id: ItemId,
    pub source_ref: SourceRef,
    pub payload: TabPayload,
    pub deferral_option: DeferralOption,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub submitted_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub wake_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_context: Option<WindowId>,
}

impl DeferredItem {
    pub fn new(
        id: ItemId,
        source_ref: SourceRef,
        payload: TabPayload,
        deferral_option: DeferralOption,
        submitted_at: DateTime<Utc>,
        deferral: Deferral,
    ) -> Self {
        Self {
            id,
            source_ref,
            payload,
            deferral_option,
            submitted_at,
            wake_at: deferral.persisted_wake_at(),
            owner_context: None,
        }
    }

    pub fn with_owner(mut self, window: Option<WindowId>) -> Self {
        self.owner_context = window;
        self
    }

    pub fn deferral(&self) -> Deferral {
        if self.deferral_option.is_indefinite() {
            Deferral::Unscheduled
        } else {
            Deferral::Scheduled {
                wake_at: self.wake_at,
            }
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.deferral().is_due(now)
    }

    /// Replace the option and wake instant in place. Id and payload are kept.
    pub fn reschedule(&mut self, option: DeferralOption, deferral: Deferral) {
        self.deferral_option = option;
        self.wake_at = deferral.persisted_wake_at();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(option: DeferralOption, deferral: Deferral) -> DeferredItem {
        let submitted = Utc.with_ymd_and_hms(2025, 7, 17, 12, 0, 0).unwrap();
        DeferredItem::new(
            ItemId::from("snoozed_x_1"),
            SourceRef::new(1),
            TabPayload::new("https://example.com", "Example"),
            option,
            submitted,
            deferral,
        )
    }

    #[test]
    fn sentinel_is_end_of_2099() {
        assert_eq!(
            indefinite_sentinel(),
            Utc.with_ymd_and_hms(2099, 12, 31, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn indefinite_item_is_never_due() {
        let item = sample(DeferralOption::Indefinite, Deferral::Unscheduled);
        assert_eq!(item.deferral(), Deferral::Unscheduled);
        assert_eq!(item.wake_at, indefinite_sentinel());

        let far = Utc.with_ymd_and_hms(2200, 1, 1, 0, 0, 0).unwrap();
        assert!(!item.is_due(far));
    }

    #[test]
    fn scheduled_item_is_due_at_its_wake_instant() {
        let wake_at = Utc.with_ymd_and_hms(2025, 7, 17, 15, 0, 0).unwrap();
        let item = sample(DeferralOption::NextFewHours, Deferral::Scheduled { wake_at });
        assert!(!item.is_due(wake_at - chrono::Duration::milliseconds(1)));
        assert!(item.is_due(wake_at));
    }

    #[test]
    fn serializes_with_epoch_millis_and_camel_case() {
        let wake_at = Utc.with_ymd_and_hms(2025, 7, 17, 15, 0, 0).unwrap();
        let item = sample(DeferralOption::NextFewHours, Deferral::Scheduled { wake_at })
            .with_owner(Some(WindowId::new(9)));
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(value["sourceRef"], 1);
        assert_eq!(value["deferralOption"], "next-few-hours");
        assert_eq!(value["wakeAt"], wake_at.timestamp_millis());
        assert_eq!(value["ownerContext"], 9);
        assert_eq!(value["payload"]["url"], "https://example.com");
        assert!(value["payload"].get("favIconUrl").is_none());
    }

    #[test]
    fn privileged_urls_are_not_restorable() {
        assert!(TabPayload::new("https://rust-lang.org", "Rust").is_restorable());
        assert!(!TabPayload::new("chrome://settings", "Settings").is_restorable());
        assert!(!TabPayload::new("about:blank", "").is_restorable());
        assert!(!TabPayload::new("  ", "").is_restorable());
    }
}
