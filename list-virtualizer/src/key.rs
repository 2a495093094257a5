use alloc::string::String;
use core::fmt;

#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use std::collections::HashMap;

/// Stable identity of an item within one data-source snapshot.
///
/// Keys drive measurement-cache attribution: a measured extent follows its key across
/// reorders and insertions, not its index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ItemKey {
    Int(i64),
    Str(String),
}

impl ItemKey {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Int(_) => None,
            Self::Str(s) => Some(s),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ItemKey {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ItemKey {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<u32> for ItemKey {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<usize> for ItemKey {
    fn from(v: usize) -> Self {
        Self::Int(v as i64)
    }
}

impl From<String> for ItemKey {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for ItemKey {
    fn from(v: &str) -> Self {
        Self::Str(String::from(v))
    }
}

#[cfg(feature = "std")]
pub(crate) type KeyMap<V> = HashMap<ItemKey, V>;
#[cfg(not(feature = "std"))]
pub(crate) type KeyMap<V> = BTreeMap<ItemKey, V>;

