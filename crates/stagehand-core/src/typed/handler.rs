//! Handler traits - reward / command を実行する Handler の定義
//!
//! # 学習ポイント
//! - Associated type (`type Settings`) による設定型の静的な対応付け
//! - Object-safe trait (DynRewardHandler, DynCommandHandler)
//! - Type erasure パターン (TypedReward<H> → DynRewardHandler)

use serde_json::Value;

use super::convert;
use super::notify::{Redemption, Replies};
use super::settings::{ConfigType, HandlerSettings};
use crate::domain::{HandlerError, HandlerName, ReplyContext};

/// RewardHandler は reward redemption を受け付ける
///
/// `enqueue` は network thread 上で呼ばれるため、重い処理はせず
/// main-thread bridge などに作業を積んですぐに戻ること。
/// 完了は `Redemption` を通して後から非同期に通知します。
///
/// # 使用例
/// ```ignore
/// struct GiveCoins;
///
/// impl RewardHandler for GiveCoins {
///     type Settings = GiveCoinsSettings;
///
///     fn enqueue(&self, redemption: Redemption, settings: GiveCoinsSettings) -> Result<(), HandlerError> {
///         bridge.run(move || {
///             add_coins(settings.amount);
///             redemption.complete(None);
///         });
///         Ok(())
///     }
/// }
/// ```
pub trait RewardHandler: Send + Sync + 'static {
    type Settings: HandlerSettings;

    fn enqueue(&self, redemption: Redemption, settings: Self::Settings) -> Result<(), HandlerError>;
}

/// CommandHandler は chat command を同期的に実行し、返信を積む
pub trait CommandHandler: Send + Sync + 'static {
    type Settings: HandlerSettings;

    fn execute(
        &self,
        context: &ReplyContext,
        settings: Self::Settings,
        replies: &mut Replies,
    ) -> Result<(), HandlerError>;
}

/// DynRewardHandler は object-safe な RewardHandler の抽象化
///
/// 生の設定 (`serde_json::Value`) を受け取り、内部で `H::Settings` に変換します。
pub trait DynRewardHandler: Send + Sync {
    fn name(&self) -> &HandlerName;

    fn config_type(&self) -> Option<ConfigType>;

    fn enqueue_dyn(&self, redemption: Redemption, raw: &Value) -> Result<(), HandlerError>;
}

pub trait DynCommandHandler: Send + Sync {
    fn name(&self) -> &HandlerName;

    fn config_type(&self) -> Option<ConfigType>;

    fn execute_dyn(
        &self,
        context: &ReplyContext,
        raw: &Value,
        replies: &mut Replies,
    ) -> Result<(), HandlerError>;
}

pub(crate) struct TypedReward<H> {
    name: HandlerName,
    handler: H,
}

impl<H: RewardHandler> TypedReward<H> {
    pub(crate) fn new(handler: H) -> Self {
        Self {
            name: HandlerName::of::<H>(),
            handler,
        }
    }
}

impl<H: RewardHandler> DynRewardHandler for TypedReward<H> {
    fn name(&self) -> &HandlerName {
        &self.name
    }

    fn config_type(&self) -> Option<ConfigType> {
        H::Settings::config_type()
    }

    fn enqueue_dyn(&self, redemption: Redemption, raw: &Value) -> Result<(), HandlerError> {
        let settings = resolve::<H::Settings>(&self.name, raw);
        self.handler.enqueue(redemption, settings)
    }
}

pub(crate) struct TypedCommand<H> {
    name: HandlerName,
    handler: H,
}

impl<H: CommandHandler> TypedCommand<H> {
    pub(crate) fn new(handler: H) -> Self {
        Self {
            name: HandlerName::of::<H>(),
            handler,
        }
    }
}

impl<H: CommandHandler> DynCommandHandler for TypedCommand<H> {
    fn name(&self) -> &HandlerName {
        &self.name
    }

    fn config_type(&self) -> Option<ConfigType> {
        H::Settings::config_type()
    }

    fn execute_dyn(
        &self,
        context: &ReplyContext,
        raw: &Value,
        replies: &mut Replies,
    ) -> Result<(), HandlerError> {
        let settings = resolve::<H::Settings>(&self.name, raw);
        self.handler.execute(context, settings, replies)
    }
}

/// Stale or broken configuration never aborts an invocation: the handler
/// gets a fresh default instead.
fn resolve<S: HandlerSettings>(handler: &HandlerName, raw: &Value) -> S {
    if S::config_type().is_none() {
        return S::default();
    }
    match convert::convert(raw) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(
                handler = %handler,
                target_type = e.target,
                error = %e.source,
                "handler configuration could not be converted; using defaults"
            );
            S::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommandId, ReplyToken, Viewer};
    use crate::typed::NoSettings;
    use chrono::Utc;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use ulid::Ulid;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct EchoSettings {
        prefix: String,
        repeat: u32,
    }

    impl HandlerSettings for EchoSettings {}

    struct Echo;

    impl CommandHandler for Echo {
        type Settings = EchoSettings;

        fn execute(
            &self,
            context: &ReplyContext,
            settings: EchoSettings,
            replies: &mut Replies,
        ) -> Result<(), HandlerError> {
            for _ in 0..settings.repeat.max(1) {
                replies.send(format!("{}{}", settings.prefix, context.arguments()));
            }
            Ok(())
        }
    }

    struct Ping;

    impl CommandHandler for Ping {
        type Settings = NoSettings;

        fn execute(
            &self,
            _context: &ReplyContext,
            _settings: NoSettings,
            replies: &mut Replies,
        ) -> Result<(), HandlerError> {
            replies.send("pong");
            Ok(())
        }
    }

    fn ctx(args: &str) -> ReplyContext {
        ReplyContext::command(
            CommandId::from_ulid(Ulid::new()),
            Viewer::new("1", "dave"),
            args,
            ReplyToken::new("chan"),
            Utc::now(),
        )
    }

    #[test]
    fn typed_command_decodes_raw_settings() {
        let handler = TypedCommand::new(Echo);
        let mut replies = Replies::new();

        handler
            .execute_dyn(&ctx("hi"), &json!({ "prefix": "> ", "repeat": 2 }), &mut replies)
            .unwrap();

        assert_eq!(replies.len(), 2);
        assert_eq!(handler.name().as_str(), "Echo");
        assert_eq!(handler.config_type().map(|t| t.name()), Some("EchoSettings"));
    }

    #[test]
    fn broken_settings_fall_back_to_defaults() {
        let handler = TypedCommand::new(Echo);
        let mut replies = Replies::new();

        handler
            .execute_dyn(&ctx("hi"), &json!({ "repeat": "lots" }), &mut replies)
            .unwrap();

        assert_eq!(replies.len(), 1);
    }

    #[test]
    fn handlers_without_settings_ignore_the_payload() {
        let handler = TypedCommand::new(Ping);
        let mut replies = Replies::new();

        handler
            .execute_dyn(&ctx(""), &json!({ "anything": [1, 2] }), &mut replies)
            .unwrap();

        assert_eq!(replies.len(), 1);
        assert!(handler.config_type().is_none());
    }
}
