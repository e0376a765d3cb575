//! Handler 側の通知ハンドル
//!
//! - `Redemption`: reward handler が受け取る。`complete` / `cancel` で消費される
//! - `Replies`: command handler が返信を積むバッファ。成功時のみ送信される
//!
//! # 一度だけの終了通知
//! `Redemption` と dispatcher 側の `Settlement` は同じフラグを共有します。
//! handler が失敗した後で dispatcher が cancel しても、handler が既に
//! complete していれば二重に通知されることはありません。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::ReplyContext;
use crate::ports::NotificationSink;

struct Shared {
    context: ReplyContext,
    sink: Arc<dyn NotificationSink>,
    settled: AtomicBool,
}

impl Shared {
    /// Returns true for the one caller that wins the race to settle.
    fn try_settle(&self) -> bool {
        self.settled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Completion handle for one reward redemption.
///
/// May be moved to another thread and settled at any later time.
pub struct Redemption {
    shared: Arc<Shared>,
}

impl Redemption {
    pub(crate) fn open(context: ReplyContext, sink: Arc<dyn NotificationSink>) -> (Self, Settlement) {
        let shared = Arc::new(Shared {
            context,
            sink,
            settled: AtomicBool::new(false),
        });
        (
            Self {
                shared: Arc::clone(&shared),
            },
            Settlement { shared },
        )
    }

    pub fn context(&self) -> &ReplyContext {
        &self.shared.context
    }

    pub fn is_settled(&self) -> bool {
        self.shared.settled.load(Ordering::Acquire)
    }

    /// Mark the redemption fulfilled. Returns false if it was already settled.
    pub fn complete(self, status: Option<String>) -> bool {
        if !self.shared.try_settle() {
            tracing::debug!(correlation = %self.context().correlation(), "redemption already settled; completion ignored");
            return false;
        }
        self.shared.sink.complete(&self.shared.context, status);
        true
    }

    /// Refund the redemption. Returns false if it was already settled.
    pub fn cancel(self, reason: Option<String>) -> bool {
        if !self.shared.try_settle() {
            tracing::debug!(correlation = %self.context().correlation(), "redemption already settled; cancellation ignored");
            return false;
        }
        self.shared.sink.cancel(&self.shared.context, reason);
        true
    }
}

impl Drop for Redemption {
    fn drop(&mut self) {
        // failing handlers drop the handle before the dispatcher cancels
        if !self.is_settled() && !std::thread::panicking() {
            tracing::debug!(
                correlation = %self.shared.context.correlation(),
                "redemption dropped without completion or cancellation"
            );
        }
    }
}

/// Dispatcher-side view of a redemption, used to cancel after a handler fault.
pub(crate) struct Settlement {
    shared: Arc<Shared>,
}

impl Settlement {
    pub(crate) fn cancel(&self, reason: Option<String>) -> bool {
        if !self.shared.try_settle() {
            return false;
        }
        self.shared.sink.cancel(&self.shared.context, reason);
        true
    }
}

/// Reply buffer for one command invocation.
#[derive(Debug, Default)]
pub struct Replies {
    messages: Vec<String>,
}

impl Replies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn flush(self, context: &ReplyContext, sink: &dyn NotificationSink) -> usize {
        let n = self.messages.len();
        for message in self.messages {
            sink.reply(context, message);
        }
        n
    }
}
