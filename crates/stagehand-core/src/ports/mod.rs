//! Ports - 外部コラボレーターへの抽象化レイヤー
//!
//! Event source（network client）と時刻・ID 生成を trait で切り離します。

pub mod clock;
pub mod id_generator;
pub mod notification_sink;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::notification_sink::NotificationSink;
