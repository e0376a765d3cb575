//! Notification model: what flows back to the event source.
//!
//! The two channels are asymmetric:
//! - reward: exactly one terminating `Completed` or `Cancelled` per redemption,
//!   possibly long after dispatch returned
//! - command: zero or more `Reply` messages, produced while the command runs

use serde::{Deserialize, Serialize};

use super::reply::ReplyContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notification {
    /// Mark the redemption fulfilled.
    Completed {
        context: ReplyContext,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<String>,
    },

    /// Refund the redemption.
    Cancelled {
        context: ReplyContext,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Post a chat reply for a command.
    Reply {
        context: ReplyContext,
        message: String,
    },
}

impl Notification {
    pub fn context(&self) -> &ReplyContext {
        match self {
            Notification::Completed { context, .. }
            | Notification::Cancelled { context, .. }
            | Notification::Reply { context, .. } => context,
        }
    }

    /// True for the notifications that settle a redemption.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Notification::Completed { .. } | Notification::Cancelled { .. }
        )
    }
}
