use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable name a handler is registered (and looked up) under.
///
/// Derived from the implementing type, so registering the same type twice
/// always produces the same name. Persisted reward/command descriptors
/// refer to handlers by this string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerName(String);

impl HandlerName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Name for the implementation type `H`.
    ///
    /// Uses the last path segment of `std::any::type_name`, with generic
    /// arguments stripped: `my_mod::GiveCoins<u32>` becomes `GiveCoins`.
    pub fn of<H: ?Sized>() -> Self {
        Self(short_type_name(std::any::type_name::<H>()).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Borrow<str> for HandlerName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HandlerName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The independent namespaces names are unique within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    Reward,
    Command,
    GlobalConfig,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Namespace::Reward => "reward",
            Namespace::Command => "command",
            Namespace::GlobalConfig => "global_config",
        };
        f.write_str(s)
    }
}

pub(crate) fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct GiveCoins;

    #[allow(dead_code)]
    struct Generic<T>(T);

    #[rstest]
    #[case("GiveCoins", "GiveCoins")]
    #[case("crate::rewards::GiveCoins", "GiveCoins")]
    #[case("crate::rewards::Wrap<crate::x::Inner>", "Wrap")]
    #[case("alloc::vec::Vec<core::option::Option<u8>>", "Vec")]
    fn short_type_name_keeps_last_segment(#[case] full: &str, #[case] expected: &str) {
        assert_eq!(short_type_name(full), expected);
    }

    #[test]
    fn name_is_deterministic_per_type() {
        assert_eq!(HandlerName::of::<GiveCoins>(), HandlerName::of::<GiveCoins>());
        assert_eq!(HandlerName::of::<GiveCoins>().as_str(), "GiveCoins");
    }

    #[test]
    fn generic_arguments_do_not_change_the_name() {
        assert_eq!(
            HandlerName::of::<Generic<u8>>(),
            HandlerName::of::<Generic<String>>()
        );
    }

    #[test]
    fn serializes_as_plain_string() {
        let s = serde_json::to_string(&HandlerName::new("GiveCoins")).unwrap();
        assert_eq!(s, "\"GiveCoins\"");
    }
}
