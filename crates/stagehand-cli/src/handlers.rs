//! Demo handlers - core の利用者側の例
//!
//! Host の状態（`WORLD`）は main thread のスレッドローカルにあり、
//! bridge 経由でしか変更されません。

use std::cell::RefCell;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use rand::Rng;
use serde::{Deserialize, Serialize};
use stagehand_core::app::RegistryBuilder;
use stagehand_core::bridge;
use stagehand_core::domain::{BuildError, HandlerError, ReplyContext};
use stagehand_core::typed::{
    CommandHandler, GlobalConfigStore, HandlerRegistry, HandlerSettings, NoSettings, Redemption,
    Replies, RewardHandler,
};

#[derive(Debug, Default)]
struct World {
    gold: u32,
    hydrated: u32,
}

thread_local! {
    static WORLD: RefCell<World> = RefCell::new(World::default());
}

/// Read-only mirror of `World::gold` for command handlers on network threads.
static GOLD_MIRROR: AtomicU32 = AtomicU32::new(0);

static GLOBALS: OnceLock<GlobalConfigStore> = OnceLock::new();

pub const ECONOMY: &str = "economy";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomySettings {
    pub currency: String,
    pub max_per_redemption: u32,
}

impl Default for EconomySettings {
    fn default() -> Self {
        Self {
            currency: "gold".to_string(),
            max_per_redemption: 500,
        }
    }
}

impl HandlerSettings for EconomySettings {}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GiveGoldSettings {
    pub amount: u32,
}

impl HandlerSettings for GiveGoldSettings {}

/// Adds gold to the world on the main thread.
pub struct GiveGold;

impl RewardHandler for GiveGold {
    type Settings = GiveGoldSettings;

    fn enqueue(&self, redemption: Redemption, settings: GiveGoldSettings) -> Result<(), HandlerError> {
        let economy = economy();
        let amount = settings.amount.min(economy.max_per_redemption);
        if amount == 0 {
            return Err(HandlerError::failed("nothing to give"));
        }

        let bridge = bridge::installed().map_err(|e| HandlerError::failed(e.to_string()))?;
        bridge.run(move || {
            let total = WORLD.with_borrow_mut(|w| {
                w.gold += amount;
                w.gold
            });
            GOLD_MIRROR.store(total, Ordering::Release);
            redemption.complete(Some(format!("+{amount} {}", economy.currency)));
        });
        Ok(())
    }
}

pub struct Hydrate;

impl RewardHandler for Hydrate {
    type Settings = NoSettings;

    fn enqueue(&self, redemption: Redemption, _settings: NoSettings) -> Result<(), HandlerError> {
        let bridge = bridge::installed().map_err(|e| HandlerError::failed(e.to_string()))?;
        bridge.run(move || {
            WORLD.with_borrow_mut(|w| w.hydrated += 1);
            redemption.complete(None);
        });
        Ok(())
    }
}

/// Panics when the viewer asks for "boom"; the dispatcher refunds the redemption.
pub struct Meteor;

impl RewardHandler for Meteor {
    type Settings = NoSettings;

    fn enqueue(&self, redemption: Redemption, _settings: NoSettings) -> Result<(), HandlerError> {
        if redemption.context().arguments().contains("boom") {
            panic!("meteor hit the handler");
        }
        redemption.complete(Some("the sky is clear".to_string()));
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiceSettings {
    pub sides: u32,
}

impl Default for DiceSettings {
    fn default() -> Self {
        Self { sides: 6 }
    }
}

impl HandlerSettings for DiceSettings {}

pub struct Dice;

impl CommandHandler for Dice {
    type Settings = DiceSettings;

    fn execute(
        &self,
        context: &ReplyContext,
        settings: DiceSettings,
        replies: &mut Replies,
    ) -> Result<(), HandlerError> {
        let sides = match context.arguments().trim().strip_prefix('d') {
            Some(n) => n
                .parse::<u32>()
                .map_err(|_| HandlerError::failed(format!("bad dice: {}", context.arguments())))?,
            None => settings.sides,
        };
        if sides == 0 {
            return Err(HandlerError::failed("a die needs sides"));
        }
        let roll = rand::thread_rng().gen_range(1..=sides);
        replies.send(format!("@{} rolled {roll} (d{sides})", context.viewer().display_name));
        Ok(())
    }
}

pub struct Gold;

impl CommandHandler for Gold {
    type Settings = NoSettings;

    fn execute(
        &self,
        context: &ReplyContext,
        _settings: NoSettings,
        replies: &mut Replies,
    ) -> Result<(), HandlerError> {
        let gold = GOLD_MIRROR.load(Ordering::Acquire);
        replies.send(format!(
            "@{} the world holds {gold} {}",
            context.viewer().display_name,
            economy().currency
        ));
        Ok(())
    }
}

/// The explicit list of handlers this host ships with.
pub fn registry() -> Result<Arc<HandlerRegistry>, BuildError> {
    RegistryBuilder::new()
        .reward(GiveGold)
        .reward(Hydrate)
        .reward(Meteor)
        .command(Dice)
        .command(Gold)
        .global_config::<EconomySettings>(ECONOMY)
        .expect_rewards(&["GiveGold", "Hydrate"])
        .expect_commands(&["Dice"])
        .build()
}

pub fn install_globals(store: GlobalConfigStore) {
    if GLOBALS.set(store).is_err() {
        tracing::warn!("global config store already installed");
    }
}

fn economy() -> Arc<EconomySettings> {
    GLOBALS
        .get()
        .and_then(|store| store.get::<EconomySettings>(ECONOMY).ok())
        .unwrap_or_default()
}

pub fn world_summary() -> (u32, u32) {
    WORLD.with_borrow(|w| (w.gold, w.hydrated))
}
