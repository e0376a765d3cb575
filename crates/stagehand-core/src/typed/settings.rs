//! HandlerSettings - handler ごとの強く型付けされた設定
//!
//! # 学習ポイント
//! - Trait bounds の組み合わせ (Serialize + DeserializeOwned + Default + Send + Sync + 'static)
//! - 関数ポインタによる type erasure (`ConfigType`)
//! - `dyn Any` からの downcast

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::convert::{self, failure, type_label};
use crate::domain::ConfigConversionFailure;

/// HandlerSettings は handler が受け取る設定の型
///
/// # 使用例
/// ```ignore
/// #[derive(Default, Serialize, Deserialize)]
/// struct GiveCoinsSettings {
///     amount: u32,
/// }
///
/// impl HandlerSettings for GiveCoinsSettings {}
/// ```
///
/// # ネストした設定
/// 欠落フィールドの補完はトップレベルだけです。ネストした struct は値ごと
/// 置き換わるので、欠落を許すなら nested 型に `#[serde(default)]` を付けます。
/// enum や map はそのまま置き換わり、default と混ざることはありません。
///
/// # Trait Bounds
/// - `Serialize` / `DeserializeOwned`: 永続化された設定との相互変換のため
/// - `Default`: 欠落フィールドの補完と、変換失敗時の代替インスタンスのため
/// - `Send + Sync + 'static`: 複数スレッドから共有できるため
pub trait HandlerSettings: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    /// Descriptor for this settings type, or `None` for "no configuration".
    fn config_type() -> Option<ConfigType> {
        Some(ConfigType::of::<Self>())
    }
}

/// Settings type for handlers that take no configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoSettings;

impl HandlerSettings for NoSettings {
    fn config_type() -> Option<ConfigType> {
        None
    }
}

type Shared = Arc<dyn Any + Send + Sync>;

/// Type-erased descriptor of a settings type.
///
/// Lets the registry convert, default and materialize settings without
/// knowing the concrete type, e.g. for global configs keyed by string id.
#[derive(Clone, Copy)]
pub struct ConfigType {
    name: &'static str,
    type_id: fn() -> TypeId,
    default_value: fn() -> Result<Value, ConfigConversionFailure>,
    normalize: fn(&Value) -> Result<Value, ConfigConversionFailure>,
    materialize: fn(&Value) -> Result<Shared, ConfigConversionFailure>,
    materialize_default: fn() -> Shared,
}

impl ConfigType {
    pub fn of<T: HandlerSettings>() -> Self {
        Self {
            name: type_label::<T>(),
            type_id: TypeId::of::<T>,
            default_value: default_value::<T>,
            normalize: convert::normalize::<T>,
            materialize: materialize::<T>,
            materialize_default: materialize_default::<T>,
        }
    }

    /// Short type name, e.g. `GiveCoinsSettings`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.type_id() == TypeId::of::<T>()
    }

    /// Serialized `T::default()`.
    pub fn default_value(&self) -> Result<Value, ConfigConversionFailure> {
        (self.default_value)()
    }

    /// Convert a persisted value and serialize it back in canonical form.
    pub fn normalize(&self, value: &Value) -> Result<Value, ConfigConversionFailure> {
        (self.normalize)(value)
    }

    pub(crate) fn materialize(&self, value: &Value) -> Result<Shared, ConfigConversionFailure> {
        (self.materialize)(value)
    }

    pub(crate) fn materialize_default(&self) -> Shared {
        (self.materialize_default)()
    }
}

impl fmt::Debug for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigType").field("name", &self.name).finish()
    }
}

impl PartialEq for ConfigType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id() == other.type_id()
    }
}

impl Eq for ConfigType {}

fn default_value<T: HandlerSettings>() -> Result<Value, ConfigConversionFailure> {
    serde_json::to_value(T::default()).map_err(failure::<T>)
}

fn materialize<T: HandlerSettings>(value: &Value) -> Result<Shared, ConfigConversionFailure> {
    let typed: T = convert::convert(value)?;
    Ok(Arc::new(typed))
}

fn materialize_default<T: HandlerSettings>() -> Shared {
    Arc::new(T::default())
}
