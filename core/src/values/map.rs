use std::fmt;
use std::sync::Arc;

use ecow::EcoString;
use hashbrown::HashMap;

use super::Val;

/// Key of a map value. Only bool, int, uint and string values can be keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    Uint(u64),
    String(EcoString),
}

impl MapKey {
    /// Returns `None` when the value's type cannot key a map.
    pub fn from_val(val: &Val) -> Option<MapKey> {
        match val {
            Val::Bool(b) => Some(MapKey::Bool(*b)),
            Val::Int(i) => Some(MapKey::Int(*i)),
            Val::Uint(u) => Some(MapKey::Uint(*u)),
            Val::String(s) => Some(MapKey::String(s.clone())),
            _ => None,
        }
    }

    pub fn to_val(&self) -> Val {
        match self {
            MapKey::Bool(b) => Val::Bool(*b),
            MapKey::Int(i) => Val::Int(*i),
            MapKey::Uint(u) => Val::Uint(*u),
            MapKey::String(s) => Val::String(s.clone()),
        }
    }
}

impl From<&str> for MapKey {
    fn from(s: &str) -> Self {
        MapKey::String(EcoString::from(s))
    }
}

impl From<i64> for MapKey {
    fn from(i: i64) -> Self {
        MapKey::Int(i)
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Bool(b) => write!(f, "{}", b),
            MapKey::Int(i) => write!(f, "{}", i),
            MapKey::Uint(u) => write!(f, "{}u", u),
            MapKey::String(s) => write!(f, "{:?}", s.as_str()),
        }
    }
}

/// Immutable map preserving insertion order.
///
/// Entries live in a vector for stable iteration; a hash index maps keys to
/// their position. Clones share storage.
#[derive(Clone, Default)]
pub struct MapValue {
    inner: Arc<MapInner>,
}

#[derive(Default)]
struct MapInner {
    entries: Vec<(MapKey, Val)>,
    index: HashMap<MapKey, usize>,
}

impl MapValue {
    /// Builds a map from entries. Returns the offending key on duplicates.
    pub fn from_entries(entries: impl IntoIterator<Item = (MapKey, Val)>) -> Result<Self, MapKey> {
        let iter = entries.into_iter();
        let (lower, _) = iter.size_hint();
        let mut inner = MapInner {
            entries: Vec::with_capacity(lower),
            index: HashMap::with_capacity(lower),
        };
        for (key, value) in iter {
            if inner.index.contains_key(&key) {
                return Err(key);
            }
            inner.index.insert(key.clone(), inner.entries.len());
            inner.entries.push((key, value));
        }
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn get(&self, key: &MapKey) -> Option<&Val> {
        self.inner
            .index
            .get(key)
            .map(|&idx| &self.inner.entries[idx].1)
    }

    pub fn contains_key(&self, key: &MapKey) -> bool {
        self.inner.index.contains_key(key)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&MapKey, &Val)> {
        self.inner.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &MapKey> {
        self.inner.entries.iter().map(|(k, _)| k)
    }
}

impl fmt::Debug for MapValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
