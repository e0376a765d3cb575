//! NotificationSink port - handler から event source への通知経路
//!
//! 実装は event source（platform client）側が提供します。
//! どのスレッドからでも、dispatch が戻った後いつでも呼ばれる可能性があります。

use crate::domain::{Notification, ReplyContext};

/// NotificationSink は redemption の完了/取消と command の返信を受け取る
///
/// Handler はこの trait を直接呼びません。`Redemption` と `Replies` を経由します。
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);

    fn complete(&self, context: &ReplyContext, status: Option<String>) {
        self.notify(Notification::Completed {
            context: context.clone(),
            status,
        });
    }

    fn cancel(&self, context: &ReplyContext, reason: Option<String>) {
        self.notify(Notification::Cancelled {
            context: context.clone(),
            reason,
        });
    }

    fn reply(&self, context: &ReplyContext, message: String) {
        self.notify(Notification::Reply {
            context: context.clone(),
            message,
        });
    }
}
