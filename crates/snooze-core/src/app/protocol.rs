//! Protocol - プレゼンテーション層とのリクエスト / レスポンス
//!
//! 1 リクエスト = 1 JSON オブジェクト。`action` で操作を選ぶ。
//!
//! ```json
//! {"action": "submit", "sourceRef": 12, "option": "next-week"}
//! {"action": "snooze-tab", "tabId": 12, "snoozeOption": "tomorrow"}
//! ```
//!
//! レスポンスは常に `success` を持ち、失敗時は `error` にメッセージが入る。
//! 失敗はすべて非致命的で、サービスは次のリクエストを受け付け続ける。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{DeferralOption, DeferredItem, ItemId, SourceRef};
use crate::error::{ErrorKind, SnoozeError};

use super::service::{ItemView, SchedulingService};

/// Every action name accepted in `action`, including legacy aliases.
pub const ACTIONS: [&str; 12] = [
    "submit",
    "snooze-tab",
    "wake-now",
    "unsnooze-tab",
    "list",
    "get-snoozed-tabs",
    "reschedule",
    "update-snooze-time",
    "cancel",
    "cancel-all",
    "export",
    "import",
];

fn default_option() -> DeferralOption {
    DeferralOption::NextFewHours
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Request {
    #[serde(alias = "snooze-tab", rename_all = "camelCase")]
    Submit {
        #[serde(alias = "tabId")]
        source_ref: SourceRef,
        #[serde(alias = "snoozeOption", default = "default_option")]
        option: DeferralOption,
    },

    #[serde(alias = "unsnooze-tab", rename_all = "camelCase")]
    WakeNow {
        #[serde(alias = "snoozedTabId")]
        item_id: ItemId,
    },

    #[serde(alias = "get-snoozed-tabs")]
    List,

    #[serde(alias = "update-snooze-time", rename_all = "camelCase")]
    Reschedule {
        #[serde(alias = "snoozedTabId")]
        item_id: ItemId,
        #[serde(alias = "newTime", default = "default_option")]
        option: DeferralOption,
    },

    #[serde(rename_all = "camelCase")]
    Cancel {
        #[serde(alias = "snoozedTabId")]
        item_id: ItemId,
    },

    CancelAll,

    Export,

    Import { data: String },
}

impl Request {
    /// Parse one request. Unknown actions and malformed fields become
    /// failure responses rather than errors.
    pub fn parse(line: &str) -> Result<Self, Response> {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| Response::failure(format!("invalid request: {e}")))?;

        let action = value.get("action").and_then(Value::as_str);
        if !action.is_some_and(|a| ACTIONS.contains(&a)) {
            tracing::debug!(action = ?action, "unknown action");
            return Err(Response::failure("Unknown action"));
        }

        serde_json::from_value(value)
            .map_err(|e| Response::failure(format!("invalid request: {e}")))
    }
}

fn kind_name(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Validation => "validation",
        ErrorKind::Persistence => "persistence",
        ErrorKind::Host => "host",
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tabs: Option<Vec<ItemView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<DeferredItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<SourceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Self::default()
        }
    }

    fn from_error(err: &SnoozeError) -> Self {
        Self {
            error_kind: Some(kind_name(err.kind())),
            ..Self::failure(err.to_string())
        }
    }
}

/// Run one request against the service.
pub async fn dispatch(service: &SchedulingService, request: Request) -> Response {
    let result = match request {
        Request::Submit { source_ref, option } => {
            service.submit(source_ref, option).await.map(|item| Response {
                item: Some(item),
                ..Response::ok()
            })
        }
        Request::WakeNow { item_id } => service.wake_now(&item_id).await.map(|tab| Response {
            tab_id: Some(tab),
            ..Response::ok()
        }),
        Request::List => service.views().await.map(|views| Response {
            tabs: Some(views),
            ..Response::ok()
        }),
        Request::Reschedule { item_id, option } => {
            service.reschedule(&item_id, option).await.map(|item| Response {
                item: Some(item),
                ..Response::ok()
            })
        }
        Request::Cancel { item_id } => service.cancel(&item_id).await.map(|item| Response {
            item: Some(item),
            ..Response::ok()
        }),
        Request::CancelAll => service.cancel_all().await.map(|count| Response {
            count: Some(count),
            ..Response::ok()
        }),
        Request::Export => service.export().await.map(|data| Response {
            data: Some(data),
            ..Response::ok()
        }),
        Request::Import { data } => service.import(&data).await.map(|count| Response {
            count: Some(count),
            ..Response::ok()
        }),
    };

    result.unwrap_or_else(|err| {
        tracing::warn!(error = %err, kind = kind_name(err.kind()), "request failed");
        Response::from_error(&err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppBuilder;
    use crate::domain::{TabPayload, WindowId};
    use crate::impls::{InMemoryKvStore, InMemoryTabs, ManualAlarms};
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Arc;

    /// Parse and run one JSON line, like the event loop does.
    async fn handle_line(service: &SchedulingService, line: &str) -> Response {
        match Request::parse(line) {
            Ok(request) => dispatch(service, request).await,
            Err(response) => response,
        }
    }

    fn service_with_tab() -> (SchedulingService, Arc<InMemoryTabs>, SourceRef) {
        let tabs = Arc::new(InMemoryTabs::new());
        let source = tabs.open(TabPayload::new("https://example.com", "Example"), WindowId::new(1));
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 7, 17, 12, 0, 0).unwrap());
        let service = AppBuilder::new()
            .kv_store(Arc::new(InMemoryKvStore::new()))
            .alarm_host(Arc::new(ManualAlarms::new()))
            .tab_host(tabs.clone())
            .clock(Arc::new(clock))
            .zone("utc".parse().unwrap())
            .build()
            .unwrap();
        (service, tabs, source)
    }

    fn to_json(response: &Response) -> Value {
        serde_json::to_value(response).unwrap()
    }

    #[rstest]
    #[case::canonical(r#"{"action":"submit","sourceRef":3,"option":"next-week"}"#)]
    #[case::legacy(r#"{"action":"snooze-tab","tabId":3,"snoozeOption":"next-week"}"#)]
    fn submit_accepts_both_spellings(#[case] line: &str) {
        assert_eq!(
            Request::parse(line).unwrap(),
            Request::Submit {
                source_ref: SourceRef::new(3),
                option: DeferralOption::NextWeek
            }
        );
    }

    #[rstest]
    #[case::canonical(r#"{"action":"reschedule","itemId":"x","option":"tomorrow"}"#)]
    #[case::legacy(r#"{"action":"update-snooze-time","snoozedTabId":"x","newTime":"tomorrow"}"#)]
    fn reschedule_accepts_both_spellings(#[case] line: &str) {
        assert_eq!(
            Request::parse(line).unwrap(),
            Request::Reschedule {
                item_id: ItemId::from("x"),
                option: DeferralOption::NextMorning
            }
        );
    }

    #[test]
    fn missing_option_falls_back_to_next_few_hours() {
        let request = Request::parse(r#"{"action":"submit","sourceRef":1}"#).unwrap();
        assert!(matches!(
            request,
            Request::Submit {
                option: DeferralOption::NextFewHours,
                ..
            }
        ));
    }

    #[rstest]
    #[case::unknown(r#"{"action":"explode"}"#)]
    #[case::missing(r#"{"tabId":1}"#)]
    #[case::not_a_string(r#"{"action":7}"#)]
    fn unknown_actions_are_reported(#[case] line: &str) {
        let response = Request::parse(line).unwrap_err();
        assert_eq!(
            to_json(&response),
            json!({"success": false, "error": "Unknown action"})
        );
    }

    #[test]
    fn malformed_fields_are_invalid_requests() {
        let response = Request::parse(r#"{"action":"cancel"}"#).unwrap_err();
        assert!(!response.success);
        assert!(response.error.unwrap().starts_with("invalid request"));

        let response = Request::parse("not json").unwrap_err();
        assert!(response.error.unwrap().starts_with("invalid request"));
    }

    #[tokio::test]
    async fn submit_list_cancel_round_trip() {
        let (service, tabs, source) = service_with_tab();

        let submitted = handle_line(
            &service,
            &format!(r#"{{"action":"snooze-tab","tabId":{},"snoozeOption":"tonight"}}"#, source.get()),
        )
        .await;
        assert!(submitted.success);
        assert!(tabs.is_empty());
        let id = submitted.item.unwrap().id;

        let listed = to_json(&handle_line(&service, r#"{"action":"get-snoozed-tabs"}"#).await);
        assert_eq!(listed["success"], true);
        assert_eq!(listed["tabs"][0]["id"], id.as_str());
        assert_eq!(listed["tabs"][0]["wakeLabel"], "Today at 18:00");
        assert_eq!(listed["tabs"][0]["remaining"], "6 hours");

        let cancelled = dispatch(&service, Request::Cancel { item_id: id }).await;
        assert!(cancelled.success);

        let listed = dispatch(&service, Request::List).await;
        assert!(listed.tabs.unwrap().is_empty());
    }

    #[tokio::test]
    async fn wake_now_reports_the_new_tab() {
        let (service, tabs, source) = service_with_tab();
        let item = service
            .submit(source, DeferralOption::Indefinite)
            .await
            .unwrap();

        let response = dispatch(&service, Request::WakeNow { item_id: item.id }).await;
        assert!(response.success);
        assert!(tabs.contains(response.tab_id.unwrap()));
    }

    #[tokio::test]
    async fn failures_carry_message_and_kind() {
        let (service, _, _) = service_with_tab();
        let response = dispatch(
            &service,
            Request::WakeNow {
                item_id: ItemId::from("gone"),
            },
        )
        .await;

        let json = to_json(&response);
        assert_eq!(json["success"], false);
        assert_eq!(json["errorKind"], "validation");
        assert!(json["error"].as_str().unwrap().contains("gone"));
    }

    #[tokio::test]
    async fn export_then_import_into_another_service() {
        let (service, _, source) = service_with_tab();
        service
            .submit(source, DeferralOption::NextWeek)
            .await
            .unwrap();

        let exported = dispatch(&service, Request::Export).await.data.unwrap();

        let (other, _, _) = service_with_tab();
        let imported = handle_line(
            &other,
            &json!({"action": "import", "data": exported}).to_string(),
        )
        .await;
        assert_eq!(imported.count, Some(1));

        let cleared = dispatch(&other, Request::CancelAll).await;
        assert_eq!(cleared.count, Some(1));
    }
}
