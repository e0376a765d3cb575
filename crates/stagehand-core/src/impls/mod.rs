//! Impls - NotificationSink の実装
//!
//! # 含まれる実装
//! - **RecordingSink**: 開発用・テスト用（メモリに保持）
//! - **ChannelSink**: tokio channel で非同期の event client へ
//! - **TracingSink**: ログに出すだけ

pub mod channel_sink;
pub mod recording_sink;
pub mod tracing_sink;

pub use self::channel_sink::ChannelSink;
pub use self::recording_sink::RecordingSink;
pub use self::tracing_sink::TracingSink;
