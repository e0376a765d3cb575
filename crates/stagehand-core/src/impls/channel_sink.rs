//! ChannelSink - 非同期の event client へ通知を流す
//!
//! Handler は任意のスレッドから通知します。tokio の unbounded channel は
//! 同期コンテキストからでもブロックせずに送信できます。

use tokio::sync::mpsc;

use crate::domain::Notification;
use crate::ports::NotificationSink;

pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, notification: Notification) {
        if let Err(e) = self.tx.send(notification) {
            // receiver dropped: the event client is shutting down
            tracing::warn!(correlation = %e.0.context().correlation(), "notification dropped; event client is gone");
        }
    }
}
