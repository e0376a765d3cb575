//! Correlation identifiers (strongly-typed IDs).
//!
//! Reward redemption と chat command はそれぞれ独自の ID を持ちます。
//! どちらも ULID ベースで、Phantom type パターンにより混同できません。
//!
//! ## ULID の特性
//! - **時刻でソート可能**: 到着順にログを並べられる
//! - **分散生成可能**: event source のどのスレッドからでも調整なしで生成できる

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"redemption-", "command-"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// `T` は PhantomData で、実行時にはメモリを消費しません。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Reward redemption のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Redemption {}

impl IdMarker for Redemption {
    fn prefix() -> &'static str {
        "redemption-"
    }
}

/// Chat command のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Command {}

impl IdMarker for Command {
    fn prefix() -> &'static str {
        "command-"
    }
}

/// Identifier of one reward redemption reported by the platform.
pub type RedemptionId = Id<Redemption>;

/// Identifier of one chat command invocation.
pub type CommandId = Id<Command>;
