use crate::error::{MapError, Result};
use crate::validate;
use indexmap::IndexMap;
use std::sync::Arc;

/// An immutable map whose values all have one type
///
/// `TypedMapV` is the lightweight profile of [`TypedMap`](crate::TypedMap):
/// the single permitted type is fixed by `V` at compile time, so there is
/// nothing to check at runtime beyond key shape. Reads lend `&V` instead of
/// cloning, and the transform algebra is reduced to `with`, `without` and
/// `empty`.
///
/// The entries live behind an `Arc`, so cloning a `TypedMapV` shares them.
/// `with` and `without` copy the index once and leave the receiver intact.
///
/// # Examples
///
/// ```
/// use sovran_typedmap::{TypedMapV, MapError};
///
/// let scores = TypedMapV::new([("alice", 3u32), ("bob", 5)])?;
/// let updated = scores.with("carol", 8)?;
///
/// assert_eq!(scores.count(), 2);
/// assert_eq!(updated.keys(), vec!["alice", "bob", "carol"]);
/// assert_eq!(*updated.get("carol")?, 8);
/// # Ok::<(), MapError>(())
/// ```
#[derive(Debug, PartialEq)]
pub struct TypedMapV<V> {
    items: Arc<IndexMap<String, V>>,
}

impl<V> TypedMapV<V> {
    /// Creates a map from `entries`, in iteration order
    ///
    /// A key repeated in `entries` keeps its first position and its last
    /// value.
    ///
    /// # Errors
    ///
    /// Returns `MapError::InvalidKey` if a key is empty.
    pub fn new<I, K>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        let mut items = IndexMap::new();
        for (key, value) in entries {
            let key = key.into();
            validate::key(&key)?;
            items.insert(key, value);
        }
        Ok(Self {
            items: Arc::new(items),
        })
    }

    /// Retrieves a reference to a value in the map
    ///
    /// # Errors
    ///
    /// - Returns `MapError::InvalidKey` if `key` is empty
    /// - Returns `MapError::KeyNotFound` if the key doesn't exist
    pub fn get(&self, key: &str) -> Result<&V> {
        validate::key(key)?;
        self.items
            .get(key)
            .ok_or_else(|| MapError::KeyNotFound(key.to_string()))
    }

    /// Retrieves a reference to a value, or `default` if the key is absent
    ///
    /// # Errors
    ///
    /// Returns `MapError::InvalidKey` if `key` is empty.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a V) -> Result<&'a V> {
        validate::key(key)?;
        Ok(self.items.get(key).unwrap_or(default))
    }

    /// Returns true if the map contains the specified key
    ///
    /// # Errors
    ///
    /// Returns `MapError::InvalidKey` if `key` is empty.
    pub fn has(&self, key: &str) -> Result<bool> {
        validate::key(key)?;
        Ok(self.items.contains_key(key))
    }

    /// Returns the first value in insertion order
    ///
    /// # Errors
    ///
    /// Returns `MapError::EmptyMap` if the map has no entries.
    pub fn first(&self) -> Result<&V> {
        self.items
            .first()
            .map(|(_, value)| value)
            .ok_or(MapError::EmptyMap)
    }

    /// Returns the last value in insertion order
    ///
    /// # Errors
    ///
    /// Returns `MapError::EmptyMap` if the map has no entries.
    pub fn last(&self) -> Result<&V> {
        self.items
            .last()
            .map(|(_, value)| value)
            .ok_or(MapError::EmptyMap)
    }

    /// Returns the keys in insertion order
    pub fn keys(&self) -> Vec<String> {
        self.items.keys().cloned().collect()
    }

    /// Returns the number of entries in the map
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the map contains no entries
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &V)> + ExactSizeIterator + '_ {
        self.items.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Applies a function to all key-value pairs in insertion order
    ///
    /// Stops at the first error and returns it.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sovran_typedmap::{TypedMapV, MapError};
    /// let limits = TypedMapV::new([("cpu", 4u32), ("memory", 0)])?;
    ///
    /// let result = limits.apply(|key, limit| {
    ///     if *limit == 0 {
    ///         return Err(MapError::KeyNotFound(key.to_string()));
    ///     }
    ///     Ok(())
    /// });
    /// assert_eq!(result, Err(MapError::KeyNotFound("memory".to_string())));
    /// # Ok::<(), MapError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns any error returned by the provided function.
    pub fn apply<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&str, &V) -> Result<()>,
    {
        for (key, value) in self.items.iter() {
            f(key.as_str(), value)?;
        }
        Ok(())
    }

    /// Returns a map with no entries
    pub fn empty(&self) -> Self {
        Self {
            items: Arc::new(IndexMap::new()),
        }
    }
}

impl<V: Clone> TypedMapV<V> {
    /// Returns copies of all values in insertion order
    pub fn values(&self) -> Vec<V> {
        self.items.values().cloned().collect()
    }

    /// Returns a map with `key` set to `value`
    ///
    /// # Errors
    ///
    /// Returns `MapError::InvalidKey` if `key` is empty.
    pub fn with(&self, key: impl Into<String>, value: V) -> Result<Self> {
        let key = key.into();
        validate::key(&key)?;

        let mut items = IndexMap::clone(&self.items);
        items.insert(key, value);
        log::trace!("with produced single-type map with {} entries", items.len());
        Ok(Self {
            items: Arc::new(items),
        })
    }

    /// Returns a map without `key`
    ///
    /// # Errors
    ///
    /// - Returns `MapError::InvalidKey` if `key` is empty
    /// - Returns `MapError::KeyNotFound` if the key doesn't exist
    pub fn without(&self, key: &str) -> Result<Self> {
        self.get(key)?;

        let mut items = IndexMap::clone(&self.items);
        items.shift_remove(key);
        log::trace!(
            "without produced single-type map with {} entries",
            items.len()
        );
        Ok(Self {
            items: Arc::new(items),
        })
    }
}

// Derived `Clone` would require `V: Clone`; sharing the `Arc` doesn't.
impl<V> Clone for TypedMapV<V> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<V> Default for TypedMapV<V> {
    fn default() -> Self {
        Self {
            items: Arc::new(IndexMap::new()),
        }
    }
}
