//! Persisted reward / command descriptors
//!
//! 配信者が設定した「どの名前の handler をどの設定で呼ぶか」の一覧です。
//! 設定は handler の型とは独立した JSON のまま保存されます。

use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorKind {
    Reward,
    Command,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Descriptor {
    pub title: String,
    pub kind: DescriptorKind,
    pub handler: String,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub arguments: String,
}

/// Built-in descriptor set. Includes a stale config written by an older
/// version and a descriptor whose handler no longer exists.
pub fn defaults() -> Result<Vec<Descriptor>, serde_json::Error> {
    serde_json::from_value(json!([
        { "title": "Give 50 gold", "kind": "reward", "handler": "GiveGold",
          "config": { "amount": 50 } },
        { "title": "Gold rain", "kind": "reward", "handler": "GiveGold",
          "config": { "amount": 1000, "sparkles": true } },
        { "title": "Drink water", "kind": "reward", "handler": "Hydrate" },
        { "title": "Meteor", "kind": "reward", "handler": "Meteor", "arguments": "boom" },
        { "title": "Confetti", "kind": "reward", "handler": "Confetti" },
        { "title": "!roll", "kind": "command", "handler": "Dice", "config": { "sides": 20 } },
        { "title": "!d100", "kind": "command", "handler": "Dice", "arguments": "d100" },
        { "title": "!gold", "kind": "command", "handler": "Gold" }
    ]))
}
