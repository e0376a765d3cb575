//! App - アプリケーション層
//!
//! # 主要コンポーネント
//! - **RegistryBuilder**: 起動時の handler 登録と検証
//! - **Dispatcher**: reward / command の dispatch と失敗の隔離
//! - **CoreConfig**: dispatcher と bridge の調整値

pub mod builder;
pub mod config;
pub mod dispatcher;

pub use self::builder::RegistryBuilder;
pub use self::config::{BridgeSettings, CoreConfig, DispatchSettings};
pub use self::dispatcher::Dispatcher;
