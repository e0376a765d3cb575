//! stagehand-core
//!
//! Action-dispatch core for a live-streaming integration: named reward and
//! command handlers, typed configuration, and a bridge that marshals work
//! onto the host's main thread.
//!
//! # モジュール構成
//! - **domain**: 値型（ids, handler_name, reply, notification, outcome, errors）
//! - **ports**: 抽象化レイヤー（NotificationSink, Clock, IdGenerator）
//! - **typed**: 型付き Handler API（RewardHandler, CommandHandler, HandlerSettings, HandlerRegistry）
//! - **bridge**: main thread へのキュー（MainThreadBridge）
//! - **app**: RegistryBuilder, Dispatcher, CoreConfig
//! - **impls**: NotificationSink の実装（RecordingSink, ChannelSink, TracingSink）

pub mod app;
pub mod bridge;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod typed;

#[cfg(test)]
mod testing;

pub use self::app::{CoreConfig, Dispatcher, RegistryBuilder};
pub use self::bridge::MainThreadBridge;
pub use self::domain::{Dispatch, HandlerError, ReplyContext};
pub use self::typed::{
    CommandHandler, HandlerRegistry, HandlerSettings, NoSettings, Redemption, Replies,
    RewardHandler,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::DispatchSettings;
    use crate::domain::{Notification, ReplyToken, Viewer};
    use crate::impls::RecordingSink;
    use crate::ports::{IdGenerator, SystemClock, UlidGenerator};
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Host state that may only be touched on the main thread.
    #[derive(Default)]
    struct World {
        gold: u32,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct GoldSettings {
        amount: u32,
    }

    impl HandlerSettings for GoldSettings {}

    struct GiveGold {
        bridge: Arc<MainThreadBridge>,
        world: Arc<Mutex<World>>,
    }

    impl RewardHandler for GiveGold {
        type Settings = GoldSettings;

        fn enqueue(&self, redemption: Redemption, settings: GoldSettings) -> Result<(), HandlerError> {
            let world = self.world.clone();
            self.bridge.run(move || {
                world.lock().unwrap().gold += settings.amount;
                redemption.complete(Some(format!("+{} gold", settings.amount)));
            });
            Ok(())
        }
    }

    #[test]
    fn reward_from_network_thread_completes_after_main_thread_tick() {
        let bridge = Arc::new(MainThreadBridge::new(Duration::from_millis(2)));
        let world = Arc::new(Mutex::new(World::default()));
        let registry = RegistryBuilder::new()
            .reward(GiveGold {
                bridge: bridge.clone(),
                world: world.clone(),
            })
            .expect_rewards(&["GiveGold"])
            .build()
            .unwrap();
        let sink = Arc::new(RecordingSink::new());
        let dispatcher = Arc::new(Dispatcher::new(registry, sink.clone(), DispatchSettings::default()));
        let ids = UlidGenerator::new(SystemClock);

        let context = ReplyContext::redemption(
            ids.generate_redemption_id(),
            Viewer::new("77", "hank"),
            "",
            ReplyToken::new("chan"),
            chrono::Utc::now(),
        );

        let d = dispatcher.clone();
        let outcome = std::thread::spawn(move || d.handle_reward("GiveGold", context, &json!({ "amount": 25 })))
            .join()
            .unwrap();

        assert!(outcome.was_dispatched());
        // enqueued, not yet applied
        assert_eq!(world.lock().unwrap().gold, 0);
        assert!(sink.is_empty());

        bridge.drain_queued().unwrap();

        assert_eq!(world.lock().unwrap().gold, 25);
        assert!(matches!(
            sink.take().as_slice(),
            [Notification::Completed { status: Some(s), .. }] if s == "+25 gold"
        ));
    }
}
