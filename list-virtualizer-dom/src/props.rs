use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use list_virtualizer::ItemKey;

/// An attribute value.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum PropValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<usize> for PropValue {
    fn from(v: usize) -> Self {
        match i64::try_from(v) {
            Ok(v) => Self::Int(v),
            Err(_) => Self::Str(v.to_string()),
        }
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<ItemKey> for PropValue {
    fn from(key: ItemKey) -> Self {
        match key {
            ItemKey::Int(v) => Self::Int(v),
            ItemKey::Str(v) => Self::Str(v),
        }
    }
}

/// Inline CSS declarations in insertion order.
///
/// Setting an existing property replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Style {
    entries: Vec<(String, String)>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Applies `other` on top of `self`; `other` wins on conflicts.
    pub fn merge(&mut self, other: &Style) {
        for (name, value) in other.iter() {
            self.set(name, value);
        }
    }
}

/// Renders as a `style` attribute value: `position: absolute; top: 10px`.
impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

/// An element's attributes plus its inline style.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Props {
    pub style: Style,
    attrs: Vec<(String, PropValue)>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style.merge(&style);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<PropValue>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<PropValue> {
        let pos = self.attrs.iter().position(|(n, _)| n == name)?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &PropValue)> + '_ {
        self.attrs.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Applies `other` on top of `self`: attributes are replaced, style declarations are
    /// merged one by one.
    pub fn merge(&mut self, other: &Props) {
        for (name, value) in other.attrs() {
            self.set(name, value.clone());
        }
        self.style.merge(&other.style);
    }

    pub(crate) fn merged(mut self, other: &Props) -> Self {
        self.merge(other);
        self
    }
}
