//! Dispatch outcome: what `handle_reward` / `handle_command` report to the caller.
//!
//! This only says whether a handler was found and invoked. Whether a reward
//! was ultimately fulfilled is reported later through the notification sink.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// No handler is registered under the requested name. Nothing was notified.
    NotFound,

    /// The handler ran and returned normally.
    Invoked { elapsed: Duration, slow: bool },

    /// The handler failed (error or panic). The failure was contained and,
    /// for rewards, converted into a cancellation.
    Faulted { elapsed: Duration },
}

impl Dispatch {
    /// Whether a matching handler was found and invoked.
    pub fn was_dispatched(&self) -> bool {
        !matches!(self, Dispatch::NotFound)
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            Dispatch::NotFound => None,
            Dispatch::Invoked { elapsed, .. } | Dispatch::Faulted { elapsed } => Some(*elapsed),
        }
    }
}
