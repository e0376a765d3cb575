//! MainThreadBridge - 任意のスレッドから main thread へ作業を渡すキュー
//!
//! # 学習ポイント
//! - Mutex<VecDeque<..>> による multi-producer / single-consumer FIFO
//! - `ThreadId` による main thread の判定
//! - ロックを保持したままユーザーコードを実行しない
//!
//! # 振る舞い
//! - `run`: main thread 上なら即座に同期実行、それ以外ならキューに積んですぐ戻る
//! - `drain_queued`: host の tick ごとに main thread から呼ぶ。時間予算を超えたら
//!   残りは次の tick へ（順序は保たれる）
//!
//! キューに積んだ action の panic は捕捉しません。handler 由来の失敗の隔離は
//! dispatcher の責務です。

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use crate::domain::BridgeError;

type Action = Box<dyn FnOnce() + Send + 'static>;

/// How `run` handled an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduled {
    /// Caller was on the main thread; the action already ran.
    Inline,
    /// The action was queued for a later `drain_queued`.
    Queued,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub ran: usize,
    pub remaining: usize,
    pub elapsed: Duration,
}

pub struct MainThreadBridge {
    main: ThreadId,
    queue: Mutex<VecDeque<Action>>,
    budget: Duration,
}

impl MainThreadBridge {
    /// Bridge whose main thread is the calling thread.
    pub fn new(budget: Duration) -> Self {
        Self::for_thread(thread::current().id(), budget)
    }

    pub fn for_thread(main: ThreadId, budget: Duration) -> Self {
        Self {
            main,
            queue: Mutex::new(VecDeque::new()),
            budget,
        }
    }

    pub fn main_thread(&self) -> ThreadId {
        self.main
    }

    pub fn is_main_thread(&self) -> bool {
        thread::current().id() == self.main
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Run `action` on the main thread.
    ///
    /// Never blocks a non-main caller.
    pub fn run<F>(&self, action: F) -> Scheduled
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_main_thread() {
            action();
            return Scheduled::Inline;
        }
        self.lock().push_back(Box::new(action));
        Scheduled::Queued
    }

    /// Run queued actions, oldest first, until the queue is empty or the
    /// time budget is used up. At least one action runs per call.
    pub fn drain_queued(&self) -> Result<DrainReport, BridgeError> {
        if !self.is_main_thread() {
            return Err(BridgeError::NotMainThread);
        }

        let start = Instant::now();
        let mut ran = 0;
        loop {
            if ran > 0 && start.elapsed() >= self.budget {
                break;
            }
            // guard is dropped before the action runs
            let Some(action) = self.lock().pop_front() else {
                break;
            };
            action();
            ran += 1;
        }

        let report = DrainReport {
            ran,
            remaining: self.pending(),
            elapsed: start.elapsed(),
        };
        if report.remaining > 0 {
            tracing::trace!(ran = report.ran, remaining = report.remaining, "drain budget exhausted");
        }
        Ok(report)
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    // Actions never run while the lock is held, so a poisoned lock still
    // guards a consistent queue.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Action>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

static INSTALLED: OnceLock<MainThreadBridge> = OnceLock::new();

/// Install the process-wide bridge with the calling thread as main thread.
///
/// Call once at startup from the host's main thread.
pub fn install(budget: Duration) -> Result<&'static MainThreadBridge, BridgeError> {
    let bridge = MainThreadBridge::new(budget);
    let main = bridge.main_thread();
    INSTALLED
        .set(bridge)
        .map_err(|_| BridgeError::AlreadyInstalled)?;
    tracing::info!(main_thread = ?main, budget_ms = budget.as_millis() as u64, "main-thread bridge installed");
    installed()
}

pub fn installed() -> Result<&'static MainThreadBridge, BridgeError> {
    INSTALLED.get().ok_or(BridgeError::NotInstalled)
}
