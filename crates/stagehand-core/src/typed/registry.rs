//! HandlerRegistry - Handler の登録と管理
//!
//! # 三つの名前空間
//! - reward handlers: `HandlerName` → `Arc<dyn DynRewardHandler>`
//! - command handlers: `HandlerName` → `Arc<dyn DynCommandHandler>`
//! - global configs: 任意の文字列 id → `ConfigType`
//!
//! # 設計
//! - 起動時に構築（mutable）、その後は `Arc<HandlerRegistry>` として共有（immutable）
//! - 実行時はロックなしで並行に読み取れる
//! - 同名の二重登録はエラー。最初の登録が有効なまま残る

use std::collections::BTreeMap;
use std::sync::Arc;

use super::global::{self, GlobalSettings, Reconciliation};
use super::handler::{
    CommandHandler, DynCommandHandler, DynRewardHandler, RewardHandler, TypedCommand, TypedReward,
};
use super::settings::{ConfigType, HandlerSettings};
use crate::domain::{HandlerName, Namespace, RegistryError};

/// What a registered handler can be invoked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Reward,
    Command,
    Both,
}

/// Read-only description of one registered handler, for UIs and docs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerRecord {
    pub name: HandlerName,
    pub capability: Capability,
    pub config_type: Option<&'static str>,
}

#[derive(Default)]
pub struct HandlerRegistry {
    rewards: BTreeMap<HandlerName, Arc<dyn DynRewardHandler>>,
    commands: BTreeMap<HandlerName, Arc<dyn DynCommandHandler>>,
    globals: BTreeMap<String, ConfigType>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a reward handler under the name derived from `H`.
    pub fn register_reward<H: RewardHandler>(
        &mut self,
        handler: H,
    ) -> Result<HandlerName, RegistryError> {
        let name = HandlerName::of::<H>();
        if self.rewards.contains_key(&name) {
            return Err(rejected(Namespace::Reward, name.to_string()));
        }
        self.rewards
            .insert(name.clone(), Arc::new(TypedReward::new(handler)));
        tracing::debug!(handler = %name, "registered reward handler");
        Ok(name)
    }

    /// Register a command handler under the name derived from `H`.
    pub fn register_command<H: CommandHandler>(
        &mut self,
        handler: H,
    ) -> Result<HandlerName, RegistryError> {
        let name = HandlerName::of::<H>();
        if self.commands.contains_key(&name) {
            return Err(rejected(Namespace::Command, name.to_string()));
        }
        self.commands
            .insert(name.clone(), Arc::new(TypedCommand::new(handler)));
        tracing::debug!(handler = %name, "registered command handler");
        Ok(name)
    }

    /// Register the settings type behind a shared global config id.
    ///
    /// Several handlers may register the same id with the same type; that is
    /// accepted as sharing. The same id with a different type is a conflict.
    pub fn register_global_config<T: HandlerSettings>(
        &mut self,
        id: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let id = id.into();
        let config_type = ConfigType::of::<T>();
        match self.globals.get(&id) {
            Some(existing) if *existing == config_type => {
                tracing::debug!(id = %id, config_type = config_type.name(), "global config already registered with the same type");
                Ok(())
            }
            Some(_) => Err(rejected(Namespace::GlobalConfig, id)),
            None => {
                tracing::debug!(id = %id, config_type = config_type.name(), "registered global config");
                self.globals.insert(id, config_type);
                Ok(())
            }
        }
    }

    pub fn reward(&self, name: &str) -> Option<Arc<dyn DynRewardHandler>> {
        self.rewards.get(name).cloned()
    }

    pub fn command(&self, name: &str) -> Option<Arc<dyn DynCommandHandler>> {
        self.commands.get(name).cloned()
    }

    pub fn global_config_type(&self, id: &str) -> Option<ConfigType> {
        self.globals.get(id).copied()
    }

    pub fn reward_names(&self) -> impl Iterator<Item = &HandlerName> {
        self.rewards.keys()
    }

    pub fn command_names(&self) -> impl Iterator<Item = &HandlerName> {
        self.commands.keys()
    }

    pub fn global_ids(&self) -> impl Iterator<Item = &str> {
        self.globals.keys().map(String::as_str)
    }

    /// Every registered handler once, sorted by name.
    ///
    /// A name registered as both reward and command handler is reported with
    /// `Capability::Both`.
    pub fn records(&self) -> Vec<HandlerRecord> {
        let mut records: BTreeMap<HandlerName, HandlerRecord> = BTreeMap::new();
        for (name, handler) in &self.rewards {
            records.insert(
                name.clone(),
                HandlerRecord {
                    name: name.clone(),
                    capability: Capability::Reward,
                    config_type: handler.config_type().map(|t| t.name()),
                },
            );
        }
        for (name, handler) in &self.commands {
            records
                .entry(name.clone())
                .and_modify(|r| {
                    r.capability = Capability::Both;
                    if r.config_type.is_none() {
                        r.config_type = handler.config_type().map(|t| t.name());
                    }
                })
                .or_insert_with(|| HandlerRecord {
                    name: name.clone(),
                    capability: Capability::Command,
                    config_type: handler.config_type().map(|t| t.name()),
                });
        }
        records.into_values().collect()
    }

    /// Reconcile a persisted global settings collection with the registered ids.
    pub fn ensure_global_settings(&self, settings: &mut GlobalSettings) -> Reconciliation {
        global::reconcile(&self.globals, settings)
    }

    pub fn len(&self) -> usize {
        self.rewards.len() + self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty() && self.commands.is_empty()
    }
}

fn rejected(namespace: Namespace, name: String) -> RegistryError {
    let err = RegistryError::AlreadyRegistered { namespace, name };
    tracing::warn!(error = %err, "registration rejected; keeping the first registration");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HandlerError;
    use crate::typed::{NoSettings, Redemption, Replies};
    use crate::domain::ReplyContext;
    use crate::testing::capture_logs;
    use tracing::Level;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct CoinSettings {
        amount: u32,
    }

    impl HandlerSettings for CoinSettings {}

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct OtherSettings {
        amount: u32,
    }

    impl HandlerSettings for OtherSettings {}

    struct GiveCoins;

    impl RewardHandler for GiveCoins {
        type Settings = CoinSettings;

        fn enqueue(&self, redemption: Redemption, _settings: CoinSettings) -> Result<(), HandlerError> {
            redemption.complete(None);
            Ok(())
        }
    }

    impl CommandHandler for GiveCoins {
        type Settings = NoSettings;

        fn execute(
            &self,
            _context: &ReplyContext,
            _settings: NoSettings,
            replies: &mut Replies,
        ) -> Result<(), HandlerError> {
            replies.send("coins!");
            Ok(())
        }
    }

    mod elsewhere {
        use super::*;

        /// Same short name as the outer `GiveCoins`.
        pub struct GiveCoins;

        impl RewardHandler for GiveCoins {
            type Settings = NoSettings;

            fn enqueue(&self, redemption: Redemption, _settings: NoSettings) -> Result<(), HandlerError> {
                redemption.cancel(None);
                Ok(())
            }
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = HandlerRegistry::new();
        let name = registry.register_reward(GiveCoins).unwrap();

        assert_eq!(name.as_str(), "GiveCoins");
        assert!(registry.reward("GiveCoins").is_some());
        assert!(registry.command("GiveCoins").is_none());
    }

    #[test]
    fn test_double_registration_keeps_first() {
        let mut registry = HandlerRegistry::new();
        registry.register_reward(GiveCoins).unwrap();

        let result = registry.register_reward(elsewhere::GiveCoins);
        assert!(matches!(
            result,
            Err(RegistryError::AlreadyRegistered { namespace: Namespace::Reward, .. })
        ));

        // first registration still authoritative: it has settings, the second would not
        let handler = registry.reward("GiveCoins").unwrap();
        assert_eq!(handler.config_type().map(|t| t.name()), Some("CoinSettings"));
        assert_eq!(registry.reward_names().count(), 1);
    }

    #[test]
    fn test_conflict_is_logged_by_the_registry() {
        let mut registry = HandlerRegistry::new();
        registry.register_command(GiveCoins).unwrap();

        let (result, logs) = capture_logs(Level::WARN, || registry.register_command(GiveCoins));

        assert!(result.is_err());
        assert!(logs.contains("WARN"));
        assert!(logs.contains("command handler 'GiveCoins' is already registered"));
    }

    #[test]
    fn test_namespaces_are_independent() {
        let mut registry = HandlerRegistry::new();
        registry.register_reward(GiveCoins).unwrap();
        registry.register_command(GiveCoins).unwrap();

        let records = registry.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].capability, Capability::Both);
        assert_eq!(records[0].config_type, Some("CoinSettings"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_global_config_conflicts_only_on_type_change() {
        let mut registry = HandlerRegistry::new();
        registry.register_global_config::<CoinSettings>("economy").unwrap();
        registry.register_global_config::<CoinSettings>("economy").unwrap();

        let err = registry
            .register_global_config::<OtherSettings>("economy")
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::AlreadyRegistered { namespace: Namespace::GlobalConfig, .. }
        ));
        assert!(registry.global_config_type("economy").unwrap().is::<CoinSettings>());
        assert_eq!(registry.global_ids().collect::<Vec<_>>(), vec!["economy"]);
    }
}
