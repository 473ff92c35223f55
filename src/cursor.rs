//! Walks a collection one step at a time.
//!
//! A [`Cursor`] is created once per walk from anything implementing
//! [`Collection`]: an ordered sequence, where keys are positions, or a keyed
//! mapping, where keys are field names in the mapping's stable enumeration
//! order. Each call to [`Cursor::take_next`] hands out one [`Step`] until the
//! collection is exhausted, after which it keeps returning `None`.
//!
//! Input that cannot be walked, such as a missing collection or a JSON
//! scalar, is rejected up front with [`Error::InvalidCollection`].

use std::{
    collections::{BTreeMap, VecDeque, btree_map, vec_deque},
    fmt,
    iter::{Enumerate, FusedIterator},
    slice, vec,
};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::trace;

use crate::Error;

/// A collection that can be walked by a [`Cursor`].
///
/// Implementations list their entries in a stable order: position order for
/// sequences and insertion (or key) order for mappings. The order is fixed
/// when the cursor is created.
///
/// Borrowed collections name themselves as their [`Source`](Collection::Source)
/// so every [`Step`] can point back at what is being walked. Owned
/// collections are moved into the cursor and use `()`.
pub trait Collection {
    type Key;
    type Value;
    type Source: Clone;
    type Entries: ExactSizeIterator<Item = (Self::Key, Self::Value)>;

    /// Handle on the collection that is copied into every step.
    fn source(&self) -> Self::Source;

    /// Consumes the collection and lists its entries, or rejects it.
    fn entries(self) -> Result<Self::Entries, Error>;
}

/// Snapshot of a single cursor advance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step<K, V, S = ()> {
    /// The walked collection, for borrowed collections.
    pub collection: S,
    /// Position for sequences, field name for mappings.
    pub key: K,
    pub value: V,
    /// Number of steps taken before this one. Independent of `key`.
    pub index: usize,
    /// Number of entries in the walked collection.
    pub total: usize,
}

/// Stateful "take next" walker over a [`Collection`].
///
/// The position only ever moves forward. Once it reaches the total every
/// further call reports exhaustion again, without wrapping around or
/// panicking.
#[must_use = "a cursor does nothing unless advanced"]
pub struct Cursor<C: Collection> {
    source: C::Source,
    entries: C::Entries,
    position: usize,
    total: usize,
}

/// Creates a cursor over `collection`.
///
/// Fails with [`Error::InvalidCollection`] if the input is neither a sequence
/// nor a mapping.
pub fn make_cursor<C: Collection>(collection: C) -> Result<Cursor<C>, Error> {
    Cursor::new(collection)
}

impl<C: Collection> Cursor<C> {
    /// Same as [`make_cursor`].
    pub fn new(collection: C) -> Result<Self, Error> {
        let source = collection.source();
        let entries = collection.entries()?;
        let total = entries.len();
        trace!(total, "cursor created");
        Ok(Cursor {
            source,
            entries,
            position: 0,
            total,
        })
    }

    /// Returns the next step, or `None` once the walk is done.
    pub fn take_next(&mut self) -> Option<Step<C::Key, C::Value, C::Source>> {
        if self.position >= self.total {
            return None;
        }
        match self.entries.next() {
            Some((key, value)) => {
                let index = self.position;
                self.position += 1;
                trace!(index, total = self.total, "cursor advanced");
                Some(Step {
                    collection: self.source.clone(),
                    key,
                    value,
                    index,
                    total: self.total,
                })
            }
            None => {
                // The entry list came up short of its reported length.
                self.position = self.total;
                None
            }
        }
    }

    /// Number of entries in the walked collection.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of steps handed out so far.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.total
    }
}

impl<C: Collection> Iterator for Cursor<C> {
    type Item = Step<C::Key, C::Value, C::Source>;

    fn next(&mut self) -> Option<Self::Item> {
        self.take_next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.position;
        (remaining, Some(remaining))
    }
}

impl<C: Collection> ExactSizeIterator for Cursor<C> {}

impl<C: Collection> FusedIterator for Cursor<C> {}

impl<C: Collection> fmt::Debug for Cursor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("position", &self.position)
            .field("total", &self.total)
            .finish()
    }
}

impl<T> Collection for Vec<T> {
    type Key = usize;
    type Value = T;
    type Source = ();
    type Entries = Enumerate<vec::IntoIter<T>>;

    fn source(&self) -> Self::Source {}

    fn entries(self) -> Result<Self::Entries, Error> {
        Ok(self.into_iter().enumerate())
    }
}

impl<T, const N: usize> Collection for [T; N] {
    type Key = usize;
    type Value = T;
    type Source = ();
    type Entries = Enumerate<std::array::IntoIter<T, N>>;

    fn source(&self) -> Self::Source {}

    fn entries(self) -> Result<Self::Entries, Error> {
        Ok(self.into_iter().enumerate())
    }
}

impl<'a, T> Collection for &'a [T] {
    type Key = usize;
    type Value = &'a T;
    type Source = Self;
    type Entries = Enumerate<slice::Iter<'a, T>>;

    fn source(&self) -> Self::Source {
        *self
    }

    fn entries(self) -> Result<Self::Entries, Error> {
        Ok(self.iter().enumerate())
    }
}

impl<'a, T> Collection for &'a Vec<T> {
    type Key = usize;
    type Value = &'a T;
    type Source = Self;
    type Entries = Enumerate<slice::Iter<'a, T>>;

    fn source(&self) -> Self::Source {
        *self
    }

    fn entries(self) -> Result<Self::Entries, Error> {
        Ok(self.iter().enumerate())
    }
}

impl<T> Collection for VecDeque<T> {
    type Key = usize;
    type Value = T;
    type Source = ();
    type Entries = Enumerate<vec_deque::IntoIter<T>>;

    fn source(&self) -> Self::Source {}

    fn entries(self) -> Result<Self::Entries, Error> {
        Ok(self.into_iter().enumerate())
    }
}

impl<K, V> Collection for IndexMap<K, V> {
    type Key = K;
    type Value = V;
    type Source = ();
    type Entries = indexmap::map::IntoIter<K, V>;

    fn source(&self) -> Self::Source {}

    fn entries(self) -> Result<Self::Entries, Error> {
        Ok(self.into_iter())
    }
}

impl<'a, K, V> Collection for &'a IndexMap<K, V> {
    type Key = &'a K;
    type Value = &'a V;
    type Source = Self;
    type Entries = indexmap::map::Iter<'a, K, V>;

    fn source(&self) -> Self::Source {
        *self
    }

    fn entries(self) -> Result<Self::Entries, Error> {
        Ok(self.iter())
    }
}

impl<K, V> Collection for BTreeMap<K, V> {
    type Key = K;
    type Value = V;
    type Source = ();
    type Entries = btree_map::IntoIter<K, V>;

    fn source(&self) -> Self::Source {}

    fn entries(self) -> Result<Self::Entries, Error> {
        Ok(self.into_iter())
    }
}

impl<'a, K, V> Collection for &'a BTreeMap<K, V> {
    type Key = &'a K;
    type Value = &'a V;
    type Source = Self;
    type Entries = btree_map::Iter<'a, K, V>;

    fn source(&self) -> Self::Source {
        *self
    }

    fn entries(self) -> Result<Self::Entries, Error> {
        Ok(self.iter())
    }
}

/// A missing collection is never walkable.
impl<C: Collection> Collection for Option<C> {
    type Key = C::Key;
    type Value = C::Value;
    type Source = Option<C::Source>;
    type Entries = C::Entries;

    fn source(&self) -> Self::Source {
        self.as_ref().map(C::source)
    }

    fn entries(self) -> Result<Self::Entries, Error> {
        match self {
            Some(collection) => collection.entries(),
            None => Err(Error::invalid_collection("undefined", "undefined")),
        }
    }
}

/// Key of a walked JSON value: a position in an array or a field of an object.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum JsonKey {
    Index(usize),
    Name(String),
}

impl fmt::Display for JsonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonKey::Index(index) => write!(f, "{index}"),
            JsonKey::Name(name) => f.write_str(name),
        }
    }
}

/// Entries of a walked JSON array or object.
pub enum JsonEntries {
    Array(Enumerate<vec::IntoIter<Value>>),
    Object(serde_json::map::IntoIter),
}

impl Iterator for JsonEntries {
    type Item = (JsonKey, Value);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            JsonEntries::Array(items) => items
                .next()
                .map(|(index, value)| (JsonKey::Index(index), value)),
            JsonEntries::Object(fields) => fields
                .next()
                .map(|(name, value)| (JsonKey::Name(name), value)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            JsonEntries::Array(items) => items.size_hint(),
            JsonEntries::Object(fields) => fields.size_hint(),
        }
    }
}

impl ExactSizeIterator for JsonEntries {}

/// Arrays walk by position, objects by field in insertion order. Every
/// other JSON value is rejected with its type tag.
impl Collection for Value {
    type Key = JsonKey;
    type Value = Value;
    type Source = ();
    type Entries = JsonEntries;

    fn source(&self) -> Self::Source {}

    fn entries(self) -> Result<Self::Entries, Error> {
        match self {
            Value::Array(items) => Ok(JsonEntries::Array(items.into_iter().enumerate())),
            Value::Object(fields) => Ok(JsonEntries::Object(fields.into_iter())),
            Value::Null => Err(Error::invalid_collection("null", "null")),
            Value::Bool(flag) => Err(Error::invalid_collection(flag.to_string(), "boolean")),
            Value::Number(number) => {
                Err(Error::invalid_collection(number.to_string(), "number"))
            }
            Value::String(text) => Err(Error::invalid_collection(text, "string")),
        }
    }
}

