//! Config Resolver - 緩く型付けされた設定を handler の設定型へ変換
//!
//! # 変換フロー
//! 1. source を serde_json::Value へシリアライズ（default と同じ値も保持）
//! 2. `T::default()` の Value に source のトップレベルのフィールドを重ねる
//!    （ネストした値は丸ごと置き換える）
//! 3. マージ結果を T にデシリアライズ
//!
//! # 許容する差分
//! - source にあって T にないフィールド: 無視（serde の既定動作）
//! - T にあって source にないフィールド: `T::default()` の値で埋める
//! - `null`（トップレベル）: 欠落と同じ扱い
//!
//! ネストした struct の欠落フィールドは、その型の `#[serde(default)]` で補完します。
//!
//! 型が合わない場合（int の位置に string など）は `ConfigConversionFailure`。
//! 部分的に埋まったインスタンスは決して返しません。

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::domain::ConfigConversionFailure;
use crate::domain::handler_name::short_type_name;

/// Convert any serializable value into `T`.
pub fn convert<S, T>(source: &S) -> Result<T, ConfigConversionFailure>
where
    S: Serialize + ?Sized,
    T: Serialize + DeserializeOwned + Default,
{
    let source = serde_json::to_value(source).map_err(failure::<T>)?;
    let mut merged = serde_json::to_value(T::default()).map_err(failure::<T>)?;
    overlay(&mut merged, source);
    serde_json::from_value(merged).map_err(failure::<T>)
}

/// Like [`convert`], but substitutes a fresh `T::default()` on failure.
pub fn convert_or_default<S, T>(source: &S) -> T
where
    S: Serialize + ?Sized,
    T: Serialize + DeserializeOwned + Default,
{
    match convert(source) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(target_type = e.target, error = %e.source, "config conversion failed; using defaults");
            T::default()
        }
    }
}

/// Canonical persisted form of `source` as `T`: converted, then serialized back.
pub(crate) fn normalize<T>(source: &Value) -> Result<Value, ConfigConversionFailure>
where
    T: Serialize + DeserializeOwned + Default,
{
    let typed: T = convert(source)?;
    serde_json::to_value(typed).map_err(failure::<T>)
}

pub(crate) fn failure<T>(source: serde_json::Error) -> ConfigConversionFailure {
    ConfigConversionFailure {
        target: type_label::<T>(),
        source,
    }
}

pub(crate) fn type_label<T: ?Sized>() -> &'static str {
    short_type_name(std::any::type_name::<T>())
}

fn overlay(base: &mut Value, source: Value) {
    match (base, source) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(source)) => merge_fields(base, source),
        (base, source) => *base = source,
    }
}

// one level only: nested values are replaced whole
fn merge_fields(base: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        if !value.is_null() {
            base.insert(key, value);
        }
    }
}
