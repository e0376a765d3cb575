//! Global configs - 複数の handler が共有する設定
//!
//! # 構成
//! - `GlobalSettings`: 永続化される id → 値 のコレクション（緩い型）
//! - `reconcile`: 登録済み id とコレクションの突き合わせ（冪等）
//! - `GlobalConfigStore`: 型付きの値を初回アクセス時に生成してキャッシュ

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::convert::type_label;
use super::registry::HandlerRegistry;
use super::settings::{ConfigType, HandlerSettings};
use crate::domain::GlobalConfigError;

/// Persisted global config entries, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalSettings {
    entries: BTreeMap<String, Value>,
}

impl GlobalSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.entries.get(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(id.into(), value)
    }

    pub fn remove(&mut self, id: &str) -> Option<Value> {
        self.entries.remove(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for GlobalSettings {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Summary of one `ensure_global_settings` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Registered ids that were missing and got a default instance.
    pub added: usize,
    /// Present entries converted to their registered type.
    pub converted: usize,
    /// Present entries that failed conversion and were replaced by defaults.
    pub reset: usize,
    /// Entries whose id is no longer registered.
    pub removed: usize,
}

pub(crate) fn reconcile(
    types: &BTreeMap<String, ConfigType>,
    settings: &mut GlobalSettings,
) -> Reconciliation {
    let mut report = Reconciliation::default();

    let stale: Vec<String> = settings
        .entries
        .keys()
        .filter(|id| !types.contains_key(id.as_str()))
        .cloned()
        .collect();
    for id in stale {
        settings.entries.remove(&id);
        tracing::debug!(id = %id, "removed global config that is no longer registered");
        report.removed += 1;
    }

    for (id, config_type) in types {
        let next = match settings.entries.get(id) {
            None => {
                report.added += 1;
                config_type.default_value()
            }
            Some(current) => match config_type.normalize(current) {
                Ok(value) => {
                    report.converted += 1;
                    Ok(value)
                }
                Err(e) => {
                    tracing::warn!(id = %id, target_type = e.target, error = %e.source, "global config could not be converted; resetting to defaults");
                    report.reset += 1;
                    config_type.default_value()
                }
            },
        };
        match next {
            Ok(value) => {
                settings.entries.insert(id.clone(), value);
            }
            // only reachable when T::default() itself cannot be serialized
            Err(e) => {
                tracing::error!(id = %id, error = %e, "cannot serialize default global config");
            }
        }
    }

    tracing::info!(
        added = report.added,
        converted = report.converted,
        reset = report.reset,
        removed = report.removed,
        "global settings reconciled"
    );
    report
}

/// A registered global config and its lazily materialized value.
pub struct GlobalConfigRecord {
    id: String,
    config_type: ConfigType,
    current: OnceLock<Arc<dyn Any + Send + Sync>>,
}

impl GlobalConfigRecord {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config_type(&self) -> ConfigType {
        self.config_type
    }

    pub fn is_materialized(&self) -> bool {
        self.current.get().is_some()
    }
}

/// Typed, read-only access to global configs.
///
/// Built from the registry and a persisted collection (ideally after
/// `ensure_global_settings`). Each value is converted on first access and
/// cached; rebuild the store to pick up edited settings.
pub struct GlobalConfigStore {
    records: BTreeMap<String, GlobalConfigRecord>,
    settings: GlobalSettings,
}

impl GlobalConfigStore {
    pub fn new(registry: &HandlerRegistry, settings: GlobalSettings) -> Self {
        let records = registry
            .global_ids()
            .filter_map(|id| {
                registry.global_config_type(id).map(|config_type| {
                    (
                        id.to_string(),
                        GlobalConfigRecord {
                            id: id.to_string(),
                            config_type,
                            current: OnceLock::new(),
                        },
                    )
                })
            })
            .collect();
        Self { records, settings }
    }

    pub fn record(&self, id: &str) -> Option<&GlobalConfigRecord> {
        self.records.get(id)
    }

    pub fn get<T: HandlerSettings>(&self, id: &str) -> Result<Arc<T>, GlobalConfigError> {
        let record = self
            .records
            .get(id)
            .ok_or_else(|| GlobalConfigError::Unregistered(id.to_string()))?;
        let mismatch = || GlobalConfigError::TypeMismatch {
            id: id.to_string(),
            expected: record.config_type.name(),
            requested: type_label::<T>(),
        };
        if !record.config_type.is::<T>() {
            return Err(mismatch());
        }

        let shared = record
            .current
            .get_or_init(|| self.materialize(record))
            .clone();
        shared.downcast::<T>().map_err(|_| mismatch())
    }

    fn materialize(&self, record: &GlobalConfigRecord) -> Arc<dyn Any + Send + Sync> {
        let Some(value) = self.settings.get(&record.id) else {
            return record.config_type.materialize_default();
        };
        match record.config_type.materialize(value) {
            Ok(shared) => shared,
            Err(e) => {
                tracing::warn!(id = %record.id, target_type = e.target, error = %e.source, "global config could not be converted; using defaults");
                record.config_type.materialize_default()
            }
        }
    }
}
