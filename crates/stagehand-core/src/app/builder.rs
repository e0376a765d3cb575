//! RegistryBuilder - 起動時の handler 登録（明示的な list-and-register）
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 名前の衝突は致命的ではない（ログに残して登録を続ける）
//! - 起動時検証（Fail-fast 設計）: 永続化された descriptor が参照する名前の確認

use std::sync::Arc;

use crate::domain::{BuildError, Namespace, RegistryError};
use crate::typed::{CommandHandler, HandlerRegistry, HandlerSettings, RewardHandler};

/// RegistryBuilder は HandlerRegistry を構築
///
/// # 使用例
/// ```ignore
/// let registry = RegistryBuilder::new()
///     .reward(GiveCoins)
///     .command(Dice)
///     .global_config::<EconomySettings>("economy")
///     .expect_rewards(&["GiveCoins"])
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - expect_rewards() / expect_commands() で期待される名前を登録
/// - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
/// - 不足があれば BuildError を返す
#[derive(Default)]
pub struct RegistryBuilder {
    registry: HandlerRegistry,
    conflicts: Vec<RegistryError>,
    expected_rewards: Option<Vec<String>>,
    expected_commands: Option<Vec<String>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reward<H: RewardHandler>(mut self, handler: H) -> Self {
        let result = self.registry.register_reward(handler).map(|_| ());
        self.record(result);
        self
    }

    pub fn command<H: CommandHandler>(mut self, handler: H) -> Self {
        let result = self.registry.register_command(handler).map(|_| ());
        self.record(result);
        self
    }

    pub fn global_config<T: HandlerSettings>(mut self, id: impl Into<String>) -> Self {
        let result = self.registry.register_global_config::<T>(id);
        self.record(result);
        self
    }

    pub fn expect_rewards(mut self, names: &[&str]) -> Self {
        self.expected_rewards = Some(names.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn expect_commands(mut self, names: &[&str]) -> Self {
        self.expected_commands = Some(names.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Conflicts seen so far. The first registration of each name was kept.
    pub fn conflicts(&self) -> &[RegistryError] {
        &self.conflicts
    }

    /// Freeze the registry.
    ///
    /// # 検証
    /// - 期待された名前が全て登録されているかチェック
    /// - 不足があれば BuildError::MissingHandlers を返す
    pub fn build(self) -> Result<Arc<HandlerRegistry>, BuildError> {
        if let Some(expected) = &self.expected_rewards {
            let registered: Vec<&str> = self.registry.reward_names().map(|n| n.as_str()).collect();
            check_expected(Namespace::Reward, expected, &registered)?;
        }
        if let Some(expected) = &self.expected_commands {
            let registered: Vec<&str> = self.registry.command_names().map(|n| n.as_str()).collect();
            check_expected(Namespace::Command, expected, &registered)?;
        }

        tracing::info!(
            rewards = self.registry.reward_names().count(),
            commands = self.registry.command_names().count(),
            global_configs = self.registry.global_ids().count(),
            conflicts = self.conflicts.len(),
            "handler registry built"
        );
        Ok(Arc::new(self.registry))
    }

    fn record(&mut self, result: Result<(), RegistryError>) {
        if let Err(e) = result {
            // already logged by the registry
            tracing::debug!(error = %e, conflicts = self.conflicts.len() + 1, "registration conflict recorded");
            self.conflicts.push(e);
        }
    }
}

fn check_expected(
    namespace: Namespace,
    expected: &[String],
    registered: &[&str],
) -> Result<(), BuildError> {
    let missing: Vec<String> = expected
        .iter()
        .filter(|x| !registered.contains(&x.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(BuildError::MissingHandlers {
            namespace,
            names: missing,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HandlerError, ReplyContext};
    use crate::typed::{NoSettings, Redemption, Replies};
    use serde::{Deserialize, Serialize};

    struct Hydrate;

    impl RewardHandler for Hydrate {
        type Settings = NoSettings;

        fn enqueue(&self, redemption: Redemption, _settings: NoSettings) -> Result<(), HandlerError> {
            redemption.complete(None);
            Ok(())
        }
    }

    struct Lurk;

    impl CommandHandler for Lurk {
        type Settings = NoSettings;

        fn execute(
            &self,
            _context: &ReplyContext,
            _settings: NoSettings,
            _replies: &mut Replies,
        ) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    #[derive(Default, Serialize, Deserialize)]
    struct A {
        x: u8,
    }

    impl HandlerSettings for A {}

    #[derive(Default, Serialize, Deserialize)]
    struct B {
        y: u8,
    }

    impl HandlerSettings for B {}

    #[test]
    fn test_build_success() {
        let registry = RegistryBuilder::new()
            .reward(Hydrate)
            .command(Lurk)
            .expect_rewards(&["Hydrate"])
            .expect_commands(&["Lurk"])
            .build()
            .unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_build_missing_handlers() {
        let result = RegistryBuilder::new()
            .reward(Hydrate)
            .expect_rewards(&["Hydrate", "Raid"])
            .build();
        assert!(matches!(
            result,
            Err(BuildError::MissingHandlers { namespace: Namespace::Reward, names }) if names == vec!["Raid".to_string()]
        ));
    }

    #[test]
    fn test_conflicts_do_not_abort_startup() {
        let builder = RegistryBuilder::new()
            .reward(Hydrate)
            .reward(Hydrate)
            .global_config::<A>("shared")
            .global_config::<B>("shared")
            .command(Lurk);

        assert_eq!(builder.conflicts().len(), 2);
        let registry = builder.build().unwrap();
        assert_eq!(registry.reward_names().count(), 1);
        assert!(registry.command("Lurk").is_some());
        assert!(registry.global_config_type("shared").unwrap().is::<A>());
    }
}
