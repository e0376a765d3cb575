use crate::domain::Notification;
use crate::ports::NotificationSink;

/// Logs every notification. Useful while no platform client is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        match &notification {
            Notification::Completed { context, status } => {
                tracing::info!(correlation = %context.correlation(), viewer = %context.viewer().display_name, status = ?status, "redemption completed");
            }
            Notification::Cancelled { context, reason } => {
                tracing::info!(correlation = %context.correlation(), viewer = %context.viewer().display_name, reason = ?reason, "redemption cancelled");
            }
            Notification::Reply { context, message } => {
                tracing::info!(correlation = %context.correlation(), reply_token = context.reply_token().as_str(), message = %message, "reply");
            }
        }
    }
}
