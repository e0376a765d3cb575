//! CoreConfig - dispatcher と bridge の調整値
//!
//! すべてのフィールドは `#[serde(default)]`。設定ファイルにない値は既定値になります。

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Enqueue calls slower than this are logged as a warning. Diagnostic only.
    pub slow_enqueue_threshold_ms: u64,

    /// Viewer-facing reason sent when a reward handler fails.
    pub cancellation_reason: String,
}

impl DispatchSettings {
    pub fn slow_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_enqueue_threshold_ms)
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            slow_enqueue_threshold_ms: 3,
            cancellation_reason: "Something went wrong; the redemption was refunded.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Soft time budget for one `drain_queued` call.
    pub drain_budget_ms: u64,
}

impl BridgeSettings {
    pub fn drain_budget(&self) -> Duration {
        Duration::from_millis(self.drain_budget_ms)
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self { drain_budget_ms: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub dispatch: DispatchSettings,
    pub bridge: BridgeSettings,
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchSettings::default(),
            bridge: BridgeSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl CoreConfig {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = CoreConfig::from_json("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.dispatch.slow_threshold(), Duration::from_millis(3));
        assert_eq!(config.bridge.drain_budget(), Duration::from_millis(2));
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config =
            CoreConfig::from_json(r#"{ "dispatch": { "slow_enqueue_threshold_ms": 10 } }"#).unwrap();
        assert_eq!(config.dispatch.slow_enqueue_threshold_ms, 10);
        assert_eq!(
            config.dispatch.cancellation_reason,
            DispatchSettings::default().cancellation_reason
        );
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(CoreConfig::from_json(r#"{ "bridge": { "drain_budget_ms": "fast" } }"#).is_err());
    }
}
