use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::key::KeyMap;
use crate::{Error, ItemKey};

/// Consumer-supplied key function: `(item, index) -> key`.
pub type KeyFn<T> = Arc<dyn Fn(&T, usize) -> ItemKey + Send + Sync>;

/// Field names checked, in order, when deriving a key from an object-like item.
pub const KEY_FIELDS: [&str; 7] = ["id", "Id", "ID", "uuid", "UUID", "key", "sku"];

/// Lets an item type take part in automatic key derivation.
///
/// Primitive items return their own value from `primitive_key`. Object-like items expose
/// fields through `field_key`, which is checked against [`KEY_FIELDS`] in order. Items that
/// provide neither fall back to their index.
///
/// Index keys are only stable for append-only data: inserting or removing anywhere but the
/// tail moves measurements onto the wrong items. Supply an explicit key function for any
/// data source whose order changes.
pub trait Identify {
    fn primitive_key(&self) -> Option<ItemKey> {
        None
    }

    fn field_key(&self, _field: &str) -> Option<ItemKey> {
        None
    }
}

/// Derives the key of `item` at `index` without an explicit key function.
pub fn probe_key<T: Identify + ?Sized>(item: &T, index: usize) -> ItemKey {
    if let Some(key) = item.primitive_key() {
        return key;
    }
    KEY_FIELDS
        .iter()
        .find_map(|field| item.field_key(field))
        .unwrap_or_else(|| {
            vtrace!(index, "probe_key: positional fallback");
            ItemKey::from(index)
        })
}

macro_rules! identify_lossless {
    ($($t:ty),*) => {$(
        impl Identify for $t {
            fn primitive_key(&self) -> Option<ItemKey> {
                Some(ItemKey::Int(*self as i64))
            }
        }
    )*};
}

macro_rules! identify_unsigned {
    ($($t:ty),*) => {$(
        impl Identify for $t {
            fn primitive_key(&self) -> Option<ItemKey> {
                Some(match i64::try_from(*self) {
                    Ok(v) => ItemKey::Int(v),
                    Err(_) => ItemKey::Str(self.to_string()),
                })
            }
        }
    )*};
}

identify_lossless!(i8, i16, i32, i64, isize, u8, u16, u32);
identify_unsigned!(u64, usize);

impl Identify for str {
    fn primitive_key(&self) -> Option<ItemKey> {
        Some(ItemKey::Str(String::from(self)))
    }
}

impl Identify for String {
    fn primitive_key(&self) -> Option<ItemKey> {
        Some(ItemKey::Str(self.clone()))
    }
}

impl Identify for char {
    fn primitive_key(&self) -> Option<ItemKey> {
        Some(ItemKey::Str(self.to_string()))
    }
}

impl Identify for bool {
    fn primitive_key(&self) -> Option<ItemKey> {
        Some(ItemKey::Str(self.to_string()))
    }
}

impl<T: Identify + ?Sized> Identify for &T {
    fn primitive_key(&self) -> Option<ItemKey> {
        (**self).primitive_key()
    }

    fn field_key(&self, field: &str) -> Option<ItemKey> {
        (**self).field_key(field)
    }
}

impl<T: Identify + ?Sized> Identify for Arc<T> {
    fn primitive_key(&self) -> Option<ItemKey> {
        (**self).primitive_key()
    }

    fn field_key(&self, field: &str) -> Option<ItemKey> {
        (**self).field_key(field)
    }
}

impl<T: Identify> Identify for Option<T> {
    fn primitive_key(&self) -> Option<ItemKey> {
        self.as_ref().and_then(Identify::primitive_key)
    }

    fn field_key(&self, field: &str) -> Option<ItemKey> {
        self.as_ref().and_then(|v| v.field_key(field))
    }
}

#[cfg(feature = "json")]
impl Identify for serde_json::Value {
    fn primitive_key(&self) -> Option<ItemKey> {
        use serde_json::Value;
        match self {
            Value::Object(_) | Value::Array(_) | Value::Null => None,
            other => json_scalar_key(other),
        }
    }

    fn field_key(&self, field: &str) -> Option<ItemKey> {
        self.as_object()?.get(field).and_then(json_scalar_key)
    }
}

#[cfg(feature = "json")]
fn json_scalar_key(value: &serde_json::Value) -> Option<ItemKey> {
    use serde_json::Value;
    match value {
        Value::String(s) => Some(ItemKey::Str(s.clone())),
        Value::Number(n) => Some(match n.as_i64() {
            Some(v) => ItemKey::Int(v),
            None => ItemKey::Str(n.to_string()),
        }),
        Value::Bool(b) => Some(ItemKey::Str(b.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Keys for one data-source snapshot.
#[derive(Clone, Debug, Default)]
pub(crate) struct KeySnapshot {
    pub(crate) keys: Vec<ItemKey>,
    /// key -> index. On collision the later index wins.
    pub(crate) positions: KeyMap<usize>,
}

impl KeySnapshot {
    pub(crate) fn index_of(&self, key: &ItemKey) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub(crate) fn contains(&self, key: &ItemKey) -> bool {
        self.positions.contains_key(key)
    }
}

/// Assigns keys to items and detects collisions within a snapshot.
pub(crate) struct KeyResolver<T> {
    key_fn: KeyFn<T>,
}

impl<T> KeyResolver<T> {
    pub(crate) fn new(key_fn: KeyFn<T>) -> Self {
        Self { key_fn }
    }

    pub(crate) fn resolve(&self, item: &T, index: usize) -> ItemKey {
        (self.key_fn)(item, index)
    }

    /// Resolves every item; collisions are returned as [`Error::KeyCollision`].
    pub(crate) fn resolve_snapshot(&self, items: &[T]) -> (KeySnapshot, Vec<Error>) {
        let mut snapshot = KeySnapshot {
            keys: Vec::with_capacity(items.len()),
            positions: KeyMap::default(),
        };
        let mut collisions = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let key = self.resolve(item, index);
            if let Some(first) = snapshot.positions.insert(key.clone(), index) {
                collisions.push(Error::KeyCollision {
                    key: key.clone(),
                    first,
                    second: index,
                });
            }
            snapshot.keys.push(key);
        }
        (snapshot, collisions)
    }
}

impl<T> Clone for KeyResolver<T> {
    fn clone(&self) -> Self {
        Self {
            key_fn: Arc::clone(&self.key_fn),
        }
    }
}
