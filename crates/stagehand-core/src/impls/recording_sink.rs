//! RecordingSink - 開発用・テスト用の通知シンク
//!
//! # 学習ポイント
//! - Mutex + Condvar による「n 件たまるまで待つ」
//! - ロック poisoning からの回復

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::domain::Notification;
use crate::ports::NotificationSink;

/// RecordingSink は受け取った通知を順番に保持する
///
/// # 使用例
/// ```ignore
/// let sink = Arc::new(RecordingSink::new());
/// let dispatcher = Dispatcher::new(registry, sink.clone(), settings);
/// dispatcher.handle_reward("GiveCoins", ctx, &config);
/// assert!(sink.wait_for(1, Duration::from_secs(1)));
/// ```
#[derive(Default)]
pub struct RecordingSink {
    notifications: Mutex<Vec<Notification>>,
    /// notify 時の通知用
    condvar: Condvar,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.lock())
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Block until at least `n` notifications are recorded or `timeout` passes.
    pub fn wait_for(&self, n: usize, timeout: Duration) -> bool {
        let start = Instant::now();
        let mut guard = self.lock();
        loop {
            if guard.len() >= n {
                return true;
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return false;
            }
            let remaining = timeout.saturating_sub(elapsed);
            let (new_guard, _) = self
                .condvar
                .wait_timeout(guard, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            guard = new_guard;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.lock().push(notification);
        self.condvar.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RedemptionId, ReplyContext, ReplyToken, Viewer};
    use chrono::Utc;
    use std::sync::Arc;
    use ulid::Ulid;

    fn ctx() -> ReplyContext {
        ReplyContext::redemption(
            RedemptionId::from_ulid(Ulid::new()),
            Viewer::new("3", "frank"),
            "",
            ReplyToken::new("chan"),
            Utc::now(),
        )
    }

    #[test]
    fn take_drains_in_arrival_order() {
        let sink = RecordingSink::new();
        sink.complete(&ctx(), Some("a".into()));
        sink.cancel(&ctx(), None);

        let taken = sink.take();
        assert!(matches!(taken[0], Notification::Completed { .. }));
        assert!(matches!(taken[1], Notification::Cancelled { .. }));
        assert!(sink.is_empty());
    }

    #[test]
    fn wait_for_wakes_on_notify() {
        let sink = Arc::new(RecordingSink::new());

        let s = sink.clone();
        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            s.reply(&ctx(), "late".into());
        });

        assert!(sink.wait_for(1, Duration::from_secs(5)));
        writer.join().unwrap();
    }

    #[test]
    fn wait_for_times_out() {
        let sink = RecordingSink::new();
        let start = Instant::now();
        assert!(!sink.wait_for(1, Duration::from_millis(100)));
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
