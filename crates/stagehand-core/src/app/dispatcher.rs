//! Dispatcher - event source から呼ばれる façade
//!
//! # フロー（reward）
//! 1. 名前で handler を探す（なければ警告ログのみ、通知なし）
//! 2. 生の設定を handler の設定型へ変換（失敗時は default）
//! 3. 計測しながら `enqueue` を呼ぶ。Err も panic も捕捉して cancel 通知に変換
//! 4. 同期部分が閾値を超えたら警告ログ（制御フローは変えない）
//!
//! Command も同じ手順で、返信は成功時のみ送信されます。
//! Handler 由来のものは何ひとつ、この境界を panic や Err として越えません。

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, error, warn};

use super::config::DispatchSettings;
use crate::domain::{
    Dispatch, DispatchError, HandlerError, HandlerName, Namespace, ReplyContext,
};
use crate::ports::NotificationSink;
use crate::typed::{DynCommandHandler, DynRewardHandler, HandlerRegistry, Redemption, Replies};

pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    sink: Arc<dyn NotificationSink>,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<HandlerRegistry>,
        sink: Arc<dyn NotificationSink>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            registry,
            sink,
            settings,
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Invoke the reward handler registered as `name`.
    ///
    /// Completion is reported later through the sink; the returned value only
    /// says whether a handler was found and invoked.
    pub fn handle_reward(&self, name: &str, context: ReplyContext, config: &Value) -> Dispatch {
        let handler = match self.reward_handler(name) {
            Ok(handler) => handler,
            Err(e) => {
                warn!(correlation = %context.correlation(), error = %e, "reward dispatch skipped");
                return Dispatch::NotFound;
            }
        };

        let correlation = context.correlation();
        let (redemption, settlement) = Redemption::open(context, Arc::clone(&self.sink));

        let start = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            handler.enqueue_dyn(redemption, config)
        }));
        let elapsed = start.elapsed();
        let slow = self.check_latency(Namespace::Reward, handler.name(), elapsed);

        match failure_message(result) {
            None => {
                debug!(handler = %handler.name(), correlation = %correlation, elapsed_us = elapsed.as_micros() as u64, "reward enqueued");
                Dispatch::Invoked { elapsed, slow }
            }
            Some(message) => {
                error!(handler = %handler.name(), correlation = %correlation, error = %message, "reward handler failed");
                if !settlement.cancel(Some(self.settings.cancellation_reason.clone())) {
                    debug!(handler = %handler.name(), correlation = %correlation, "redemption was already settled by the handler");
                }
                Dispatch::Faulted { elapsed }
            }
        }
    }

    /// Invoke the command handler registered as `name` and deliver its replies.
    pub fn handle_command(&self, name: &str, context: ReplyContext, config: &Value) -> Dispatch {
        let handler = match self.command_handler(name) {
            Ok(handler) => handler,
            Err(e) => {
                warn!(correlation = %context.correlation(), error = %e, "command dispatch skipped");
                return Dispatch::NotFound;
            }
        };

        let mut replies = Replies::new();
        let start = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            handler.execute_dyn(&context, config, &mut replies)
        }));
        let elapsed = start.elapsed();
        let slow = self.check_latency(Namespace::Command, handler.name(), elapsed);

        match failure_message(result) {
            None => {
                let sent = replies.flush(&context, self.sink.as_ref());
                debug!(handler = %handler.name(), correlation = %context.correlation(), replies = sent, "command executed");
                Dispatch::Invoked { elapsed, slow }
            }
            Some(message) => {
                error!(
                    handler = %handler.name(),
                    correlation = %context.correlation(),
                    error = %message,
                    suppressed_replies = replies.len(),
                    "command handler failed"
                );
                Dispatch::Faulted { elapsed }
            }
        }
    }

    fn reward_handler(&self, name: &str) -> Result<Arc<dyn DynRewardHandler>, DispatchError> {
        self.registry
            .reward(name)
            .ok_or_else(|| DispatchError::UnknownHandler {
                namespace: Namespace::Reward,
                name: HandlerName::new(name),
            })
    }

    fn command_handler(&self, name: &str) -> Result<Arc<dyn DynCommandHandler>, DispatchError> {
        self.registry
            .command(name)
            .ok_or_else(|| DispatchError::UnknownHandler {
                namespace: Namespace::Command,
                name: HandlerName::new(name),
            })
    }

    fn check_latency(&self, namespace: Namespace, handler: &HandlerName, elapsed: Duration) -> bool {
        let threshold = self.settings.slow_threshold();
        if elapsed <= threshold {
            return false;
        }
        warn!(
            namespace = %namespace,
            handler = %handler,
            elapsed_ms = elapsed.as_millis() as u64,
            threshold_ms = threshold.as_millis() as u64,
            "slow handler invocation on event thread"
        );
        true
    }
}

fn failure_message(result: std::thread::Result<Result<(), HandlerError>>) -> Option<String> {
    match result {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(payload) => Some(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
