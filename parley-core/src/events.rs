//! Events broadcast by the outbound scheduler.
//!
//! Hosts subscribe through [`ParleyEngine::subscribe_events`](crate::ParleyEngine::subscribe_events)
//! to mirror chatbox state in a UI or log.

use serde::{Deserialize, Serialize};

/// Source tag of a notification, used for override decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    /// Now-playing media updates.
    Media,
    /// Counter increments (emotes, stats).
    Counter,
    /// Idle / away-from-keyboard timer.
    Idle,
    /// Text arriving from an external protocol client.
    External,
}

impl NotificationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationCategory::Media => "media",
            NotificationCategory::Counter => "counter",
            NotificationCategory::Idle => "idle",
            NotificationCategory::External => "external",
        }
    }
}

impl std::str::FromStr for NotificationCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "media" | "spotify" => Ok(Self::Media),
            "counter" | "count" => Ok(Self::Counter),
            "idle" | "afk" => Ok(Self::Idle),
            "external" | "osc" => Ok(Self::External),
            other => Err(format!("unknown notification category {other:?}")),
        }
    }
}

/// What the scheduler last put in the chatbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "category", rename_all = "lowercase")]
pub enum SentKind {
    Message,
    Notification(NotificationCategory),
    Clear,
}

/// Emitted after every scheduler send attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundEvent {
    #[serde(rename_all = "camelCase")]
    MessageSent { text: String, remaining: usize },
    #[serde(rename_all = "camelCase")]
    NotificationSent {
        text: String,
        category: NotificationCategory,
        /// `true` when it replaced a same-category notification early.
        preempted: bool,
    },
    ChatboxCleared,
    #[serde(rename_all = "camelCase")]
    SendFailed { kind: SentKind, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_event_serializes_with_type_tag_and_lowercase_category() {
        let event = OutboundEvent::NotificationSent {
            text: "[now playing]".into(),
            category: NotificationCategory::Media,
            preempted: true,
        };

        let json = serde_json::to_value(&event).expect("serialize notification event");
        assert_eq!(json["type"], "notificationSent");
        assert_eq!(json["category"], "media");
        assert_eq!(json["preempted"], true);

        let round_trip: OutboundEvent =
            serde_json::from_value(json).expect("deserialize notification event");
        assert_eq!(round_trip, event);
    }

    #[test]
    fn send_failed_carries_adjacent_kind() {
        let event = OutboundEvent::SendFailed {
            kind: SentKind::Notification(NotificationCategory::Counter),
            detail: "unreachable".into(),
        };
        let json = serde_json::to_value(&event).expect("serialize failure event");
        assert_eq!(json["type"], "sendFailed");
        assert_eq!(json["kind"]["kind"], "notification");
        assert_eq!(json["kind"]["category"], "counter");

        let cleared = serde_json::to_value(OutboundEvent::ChatboxCleared).expect("serialize");
        assert_eq!(cleared["type"], "chatboxCleared");
    }

    #[test]
    fn category_parses_aliases_case_insensitively() {
        assert_eq!("AFK".parse::<NotificationCategory>(), Ok(NotificationCategory::Idle));
        assert_eq!(
            " media ".parse::<NotificationCategory>(),
            Ok(NotificationCategory::Media)
        );
        assert!("weather".parse::<NotificationCategory>().is_err());
    }

    #[test]
    fn category_rejects_non_lowercase_json() {
        let err = serde_json::from_str::<NotificationCategory>(r#""Media""#);
        assert!(err.is_err(), "expected invalid casing to fail");
    }
}
