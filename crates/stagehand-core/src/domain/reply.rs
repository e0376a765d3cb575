//! ReplyContext - event source から handler へ、そして通知経路へ戻る相関情報
//!
//! Event source (platform client) が呼び出しごとに作成し、
//! handler と Notification Protocol を変更されずに通過します。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CommandId, RedemptionId};

/// Which kind of platform event a context belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Correlation {
    Redemption(RedemptionId),
    Command(CommandId),
}

impl fmt::Display for Correlation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Correlation::Redemption(id) => id.fmt(f),
            Correlation::Command(id) => id.fmt(f),
        }
    }
}

/// The viewer who triggered the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub id: String,
    pub display_name: String,
}

impl Viewer {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Opaque routing token used by the event source to deliver a reply or a
/// redemption status back to where the event came from (channel, message id, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplyToken(String);

impl ReplyToken {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Immutable per-invocation bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyContext {
    correlation: Correlation,
    viewer: Viewer,
    arguments: String,
    reply_token: ReplyToken,
    received_at: DateTime<Utc>,
}

impl ReplyContext {
    pub fn new(
        correlation: Correlation,
        viewer: Viewer,
        arguments: impl Into<String>,
        reply_token: ReplyToken,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            correlation,
            viewer,
            arguments: arguments.into(),
            reply_token,
            received_at,
        }
    }

    pub fn redemption(
        id: RedemptionId,
        viewer: Viewer,
        arguments: impl Into<String>,
        reply_token: ReplyToken,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            Correlation::Redemption(id),
            viewer,
            arguments,
            reply_token,
            received_at,
        )
    }

    pub fn command(
        id: CommandId,
        viewer: Viewer,
        arguments: impl Into<String>,
        reply_token: ReplyToken,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            Correlation::Command(id),
            viewer,
            arguments,
            reply_token,
            received_at,
        )
    }

    pub fn correlation(&self) -> Correlation {
        self.correlation
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    /// Raw argument text as typed by the viewer (may be empty).
    pub fn arguments(&self) -> &str {
        &self.arguments
    }

    pub fn reply_token(&self) -> &ReplyToken {
        &self.reply_token
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ulid::Ulid;

    #[test]
    fn correlation_serializes_as_tagged_enum() {
        let id = RedemptionId::from_ulid(Ulid::new());
        let v = serde_json::to_value(Correlation::Redemption(id)).unwrap();
        assert_eq!(v["kind"], "redemption");
        assert!(v.get("id").is_some());
    }

    #[test]
    fn context_passes_values_through_unchanged() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let id = CommandId::from_ulid(Ulid::new());
        let ctx = ReplyContext::command(
            id,
            Viewer::new("42", "alice"),
            "  raw args ",
            ReplyToken::new("chan#1"),
            at,
        );

        assert_eq!(ctx.correlation(), Correlation::Command(id));
        assert_eq!(ctx.viewer().display_name, "alice");
        assert_eq!(ctx.arguments(), "  raw args ");
        assert_eq!(ctx.reply_token().as_str(), "chan#1");
        assert_eq!(ctx.received_at(), at);
        assert!(ctx.correlation().to_string().starts_with("command-"));
    }
}
