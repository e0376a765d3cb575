//! Typed - 型付き Handler API
//!
//! Handler の名前は型から導出され、設定は型で受け取ります。
//!
//! # 二層構造
//! - **表層（Typed）**: `RewardHandler` / `CommandHandler` trait, `HandlerSettings` - 型安全
//! - **内部（Dyn）**: `DynRewardHandler` / `DynCommandHandler`, `ConfigType` - object-safe, type erasure

pub mod convert;
pub mod global;
pub mod handler;
pub mod notify;
pub mod registry;
pub mod settings;

pub use self::convert::{convert, convert_or_default};
pub use self::global::{GlobalConfigRecord, GlobalConfigStore, GlobalSettings, Reconciliation};
pub use self::handler::{CommandHandler, DynCommandHandler, DynRewardHandler, RewardHandler};
pub use self::notify::{Redemption, Replies};
pub use self::registry::{Capability, HandlerRecord, HandlerRegistry};
pub use self::settings::{ConfigType, HandlerSettings, NoSettings};
