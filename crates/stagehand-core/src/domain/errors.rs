//! Errors - エラー型と分類
//!
//! # 分類
//! - RegistrationConflict: 同名の二重登録（非致命的、最初の登録が有効）
//! - UnknownHandler: 未登録名への dispatch（非致命的、何もしない）
//! - ConfigConversionFailure: 設定の型変換失敗（非致命的、default で代替）
//! - HandlerError: handler 本体の失敗（dispatch 境界で捕捉）
//! - BridgeError: main-thread bridge の誤用（インフラの欠陥、致命的でよい）
//!
//! SlowEnqueue は診断ログのみで、エラー型はありません。

use thiserror::Error;

use super::handler_name::{HandlerName, Namespace};

/// RegistryError は HandlerRegistry の登録エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("{namespace} handler '{name}' is already registered")]
    AlreadyRegistered {
        namespace: Namespace,
        name: String,
    },
}

/// BuildError は起動時検証のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("missing {namespace} handlers: {names:?}. These were expected but not registered.")]
    MissingHandlers {
        namespace: Namespace,
        names: Vec<String>,
    },
}

/// Persisted configuration could not be coerced into the handler's settings type.
#[derive(Debug, Error)]
#[error("cannot convert configuration into {target}: {source}")]
pub struct ConfigConversionFailure {
    pub target: &'static str,
    #[source]
    pub source: serde_json::Error,
}

/// What a handler body returns when it fails.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Config(#[from] ConfigConversionFailure),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GlobalConfigError {
    #[error("global config '{0}' is not registered")]
    Unregistered(String),

    #[error("global config '{id}' is registered as {expected}, not {requested}")]
    TypeMismatch {
        id: String,
        expected: &'static str,
        requested: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("drain_queued must be called from the main thread")]
    NotMainThread,

    #[error("main-thread bridge is already installed")]
    AlreadyInstalled,

    #[error("main-thread bridge is not installed")]
    NotInstalled,
}

/// Error raised when dispatch itself cannot proceed. Handler failures never
/// surface as this type; they are contained and reported as notifications.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no {namespace} handler registered as '{name}'")]
    UnknownHandler {
        namespace: Namespace,
        name: HandlerName,
    },
}
