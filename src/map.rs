use crate::error::{MapError, Result};
use crate::types::{ElementType, TypeSet};
use crate::validate;
use crate::value::{Element, Value};
use crate::variant::MapVariant;
use indexmap::IndexMap;
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

#[derive(Clone)]
struct Store {
    variant: Option<&'static str>,
    valid_types: Arc<TypeSet>,
    entries: IndexMap<String, Value>,
}

impl Store {
    /// A store with this store's configuration and the given entries
    fn derive(&self, entries: IndexMap<String, Value>) -> Self {
        Self {
            variant: self.variant,
            valid_types: Arc::clone(&self.valid_types),
            entries,
        }
    }

    fn lookup(&self, key: &str) -> Result<&Value> {
        validate::key(key)?;
        self.entries
            .get(key)
            .ok_or_else(|| MapError::KeyNotFound(key.to_string()))
    }

    fn same_configuration(&self, other: &Store) -> bool {
        self.variant == other.variant
            && (Arc::ptr_eq(&self.valid_types, &other.valid_types)
                || self.valid_types == other.valid_types)
    }

    fn ensure_compatible(&self, other: &Store) -> Result<()> {
        if self.same_configuration(other) {
            return Ok(());
        }
        Err(MapError::IncompatibleMaps {
            left: self.configuration(),
            right: other.configuration(),
        })
    }

    fn configuration(&self) -> String {
        match self.variant {
            Some(name) => format!("{} [{}]", name, self.valid_types),
            None => format!("[{}]", self.valid_types),
        }
    }
}

/// An immutable map from non-empty string keys to values of permitted types
///
/// A `TypedMap` starts out uninitialized and is initialized exactly once with
/// its entries and its permitted types. From then on it never changes:
/// every operation that looks like a mutation (`with`, `without`, `merge`,
/// `filter`, ...) returns a new map and leaves the receiver as it was.
///
/// Values cross the map boundary as copies. Inserting moves the value into
/// the map, and reads such as [`get`](Self::get) hand out a clone, so a
/// caller can never reach the map's own copy through a mutable reference.
/// [`iter`](Self::iter) and [`raw`](Self::raw) lend shared references
/// instead of cloning; the borrow keeps them read-only.
///
/// The guarantee covers the map's own structure and the values it holds. A
/// value whose `Clone` shares state (an `Arc<Mutex<_>>` field, say) shares it
/// with every copy; store immutable value types to stay fully immutable.
///
/// # Examples
///
/// ```
/// use sovran_typedmap::{Element, ElementType, MapError, TypedMap, Value};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Point { x: i64, y: i64 }
/// impl Element for Point {}
///
/// let empty = TypedMap::from_types([ElementType::of::<Point>()])?;
/// let points = empty.with("b", Point { x: 2, y: 2 })?;
///
/// assert!(!empty.has("b")?);
/// assert!(points.has("b")?);
/// assert_eq!(points.get_as::<Point>("b")?, Point { x: 2, y: 2 });
///
/// // Values outside the permitted types are refused
/// match points.with("x", "not-a-point") {
///     Err(MapError::InvalidType { key, .. }) => assert_eq!(key, "x"),
///     other => panic!("unexpected: {:?}", other),
/// }
/// assert!(!points.has("x")?);
/// # Ok::<(), MapError>(())
/// ```
#[derive(Clone, Default)]
pub struct TypedMap {
    store: Option<Store>,
}

impl TypedMap {
    /// Creates an uninitialized map
    ///
    /// Every operation except [`init`](Self::init) fails with
    /// `MapError::Uninitialized` until the map is initialized.
    pub fn uninit() -> Self {
        Self { store: None }
    }

    /// Creates and initializes a map
    ///
    /// # Errors
    ///
    /// See [`init`](Self::init).
    pub fn new<I, K, V, T>(entries: I, valid_types: T) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
        T: IntoIterator<Item = ElementType>,
    {
        let mut map = Self::uninit();
        map.init(entries, valid_types)?;
        Ok(map)
    }

    /// Creates an initialized map with no entries
    ///
    /// # Errors
    ///
    /// Returns `MapError::Configuration` if the type set is invalid.
    pub fn from_types<T>(valid_types: T) -> Result<Self>
    where
        T: IntoIterator<Item = ElementType>,
    {
        Self::new(std::iter::empty::<(String, Value)>(), valid_types)
    }

    /// Creates an initialized map bound to the variant `M`
    ///
    /// # Errors
    ///
    /// See [`init`](Self::init).
    pub fn of_variant<M, I, K, V>(entries: I) -> Result<Self>
    where
        M: MapVariant,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut map = Self::uninit();
        map.init_store(Some(M::NAME), entries, M::valid_types())?;
        Ok(map)
    }

    /// Initializes the map with its entries and permitted types
    ///
    /// Entries are stored in iteration order. A key repeated in `entries`
    /// keeps its first position and its last value. On error the map stays
    /// uninitialized.
    ///
    /// # Errors
    ///
    /// - Returns `MapError::Reinitialized` if the map is already initialized
    /// - Returns `MapError::Configuration` if the type set is empty, has an
    ///   empty name, or declares a name twice
    /// - Returns `MapError::InvalidKey` if a key is empty
    /// - Returns `MapError::InvalidType` if a value is not of a permitted type
    pub fn init<I, K, V, T>(&mut self, entries: I, valid_types: T) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
        T: IntoIterator<Item = ElementType>,
    {
        self.init_store(None, entries, valid_types)
    }

    fn init_store<I, K, V, T>(
        &mut self,
        variant: Option<&'static str>,
        entries: I,
        valid_types: T,
    ) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
        T: IntoIterator<Item = ElementType>,
    {
        if self.store.is_some() {
            return Err(MapError::Reinitialized);
        }

        let valid_types = Arc::new(TypeSet::new(valid_types)?);
        let mut stored = IndexMap::new();
        for (key, value) in entries {
            let key = key.into();
            let value = value.into();
            validate::key(&key)?;
            valid_types.check(&key, &value)?;
            stored.insert(key, value);
        }

        log::debug!(
            "Initialized typed map with {} entries over [{}]",
            stored.len(),
            valid_types
        );
        self.store = Some(Store {
            variant,
            valid_types,
            entries: stored,
        });
        Ok(())
    }

    /// Returns true once the map has been initialized
    pub fn is_initialized(&self) -> bool {
        self.store.is_some()
    }

    fn store(&self) -> Result<&Store> {
        self.store.as_ref().ok_or(MapError::Uninitialized)
    }

    fn transformed(operation: &str, store: Store) -> Self {
        log::trace!(
            "{} produced typed map with {} entries",
            operation,
            store.entries.len()
        );
        Self { store: Some(store) }
    }

    /// Returns the keys in insertion order
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.store()?.entries.keys().cloned().collect())
    }

    /// Returns true if the map contains `key`
    ///
    /// # Errors
    ///
    /// Returns `MapError::InvalidKey` if `key` is empty.
    pub fn has(&self, key: &str) -> Result<bool> {
        let store = self.store()?;
        validate::key(key)?;
        Ok(store.entries.contains_key(key))
    }

    /// Returns a copy of the value stored under `key`
    ///
    /// # Errors
    ///
    /// - Returns `MapError::InvalidKey` if `key` is empty
    /// - Returns `MapError::KeyNotFound` if the key doesn't exist
    pub fn get(&self, key: &str) -> Result<Value> {
        self.store()?.lookup(key).cloned()
    }

    /// Returns a copy of the value stored under `key`, if any
    pub fn get_opt(&self, key: &str) -> Result<Option<Value>> {
        let store = self.store()?;
        validate::key(key)?;
        Ok(store.entries.get(key).cloned())
    }

    /// Returns a copy of the value stored under `key`, or `default`
    ///
    /// # Errors
    ///
    /// - Returns `MapError::InvalidKey` if `key` is empty
    /// - Returns `MapError::InvalidType` if `default` is not of a permitted
    ///   type, whether or not the key exists
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Result<Value> {
        let store = self.store()?;
        let default = default.into();
        validate::key(key)?;
        store.valid_types.check(key, &default)?;
        Ok(store.entries.get(key).cloned().unwrap_or(default))
    }

    /// Returns a copy of the value stored under `key` as a `T`
    ///
    /// # Errors
    ///
    /// - Returns `MapError::KeyNotFound` if the key doesn't exist
    /// - Returns `MapError::TypeMismatch` if the value is not a `T`
    pub fn get_as<T: Element>(&self, key: &str) -> Result<T> {
        self.get(key)?
            .downcast::<T>()
            .map_err(|value| MapError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found: value.type_name(),
            })
    }

    /// Returns a copy of the first value in insertion order
    ///
    /// # Errors
    ///
    /// Returns `MapError::EmptyMap` if the map has no entries.
    pub fn first(&self) -> Result<Value> {
        self.store()?
            .entries
            .first()
            .map(|(_, value)| value.clone())
            .ok_or(MapError::EmptyMap)
    }

    /// Returns a copy of the last value in insertion order
    ///
    /// # Errors
    ///
    /// Returns `MapError::EmptyMap` if the map has no entries.
    pub fn last(&self) -> Result<Value> {
        self.store()?
            .entries
            .last()
            .map(|(_, value)| value.clone())
            .ok_or(MapError::EmptyMap)
    }

    /// Returns true if the map contains no entries
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.store()?.entries.is_empty())
    }

    /// Returns the number of entries in the map
    pub fn count(&self) -> Result<usize> {
        Ok(self.store()?.entries.len())
    }

    /// Returns the first key whose value is structurally equal to `needle`
    ///
    /// Values are compared with their `PartialEq`, never by identity; a
    /// value of a different concrete type is never equal.
    pub fn find(&self, needle: &dyn Element) -> Result<Option<String>> {
        Ok(self
            .store()?
            .entries
            .iter()
            .find(|&(_, value)| value.equals(needle))
            .map(|(key, _)| key.clone()))
    }

    /// Returns the first key, in insertion order, whose value satisfies
    /// `predicate`
    pub fn search<F>(&self, mut predicate: F) -> Result<Option<String>>
    where
        F: FnMut(&Value) -> bool,
    {
        Ok(self
            .store()?
            .entries
            .iter()
            .find(|&(_, value)| predicate(value))
            .map(|(key, _)| key.clone()))
    }

    /// Borrows the underlying ordered map without copying
    ///
    /// This is the raw view for bulk reads. Use [`entries`](Self::entries)
    /// for an owned snapshot.
    pub fn raw(&self) -> Result<&IndexMap<String, Value>> {
        Ok(&self.store()?.entries)
    }

    /// Iterates over `(key, value)` pairs in insertion order
    ///
    /// Like [`raw`](Self::raw), this lends the map's own values.
    pub fn iter(&self) -> Result<Iter<'_>> {
        Ok(Iter {
            inner: self.store()?.entries.iter(),
        })
    }

    /// Returns copies of all entries in insertion order
    pub fn entries(&self) -> Result<Vec<(String, Value)>> {
        Ok(self
            .store()?
            .entries
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    /// Returns copies of all values in insertion order
    pub fn values(&self) -> Result<Vec<Value>> {
        Ok(self.store()?.entries.values().cloned().collect())
    }

    /// The permitted types
    pub fn valid_types(&self) -> Result<&TypeSet> {
        Ok(self.store()?.valid_types.as_ref())
    }

    /// The name of the variant this map was built from, if any
    pub fn variant(&self) -> Result<Option<&'static str>> {
        Ok(self.store()?.variant)
    }

    /// Returns a map with the same configuration and no entries
    pub fn empty(&self) -> Result<Self> {
        let store = self.store()?;
        Ok(Self::transformed("empty", store.derive(IndexMap::new())))
    }

    /// Returns a map with `key` set to `value`
    ///
    /// An existing key keeps its position.
    ///
    /// # Errors
    ///
    /// - Returns `MapError::InvalidKey` if `key` is empty
    /// - Returns `MapError::InvalidType` if `value` is not of a permitted type
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        let store = self.store()?;
        let key = key.into();
        let value = value.into();
        validate::key(&key)?;
        store.valid_types.check(&key, &value)?;

        let mut next = store.clone();
        next.entries.insert(key, value);
        Ok(Self::transformed("with", next))
    }

    /// Returns a map without `key`
    ///
    /// # Errors
    ///
    /// - Returns `MapError::InvalidKey` if `key` is empty
    /// - Returns `MapError::KeyNotFound` if the key doesn't exist
    pub fn without(&self, key: &str) -> Result<Self> {
        let store = self.store()?;
        store.lookup(key)?;

        let mut next = store.clone();
        next.entries.shift_remove(key);
        Ok(Self::transformed("without", next))
    }

    /// Returns the union of this map and `other`
    ///
    /// On a key present in both, `other`'s value wins and the key keeps its
    /// position from this map. Keys only in `other` follow in `other`'s order.
    ///
    /// # Errors
    ///
    /// - Returns `MapError::Uninitialized` if `other` is not initialized
    /// - Returns `MapError::IncompatibleMaps` if `other` has a different
    ///   configuration
    /// - Returns `MapError::InvalidType` if one of `other`'s values is not of
    ///   a type this map permits
    pub fn merge(&self, other: &TypedMap) -> Result<Self> {
        let store = self.store()?;
        let other = other.store()?;
        store.ensure_compatible(other)?;

        let mut next = store.clone();
        for (key, value) in &other.entries {
            store.valid_types.check(key, value)?;
            next.entries.insert(key.clone(), value.clone());
        }
        Ok(Self::transformed("merge", next))
    }

    /// Returns the entries of this map whose keys are also in `other`
    ///
    /// # Errors
    ///
    /// Same as [`merge`](Self::merge).
    pub fn intersect(&self, other: &TypedMap) -> Result<Self> {
        let store = self.store()?;
        let other = other.store()?;
        store.ensure_compatible(other)?;
        Ok(Self::transformed(
            "intersect",
            Self::retain(store, |key, _| other.entries.contains_key(key)),
        ))
    }

    /// Returns the entries of this map whose keys are not in `other`
    ///
    /// # Errors
    ///
    /// Same as [`merge`](Self::merge).
    pub fn diff(&self, other: &TypedMap) -> Result<Self> {
        let store = self.store()?;
        let other = other.store()?;
        store.ensure_compatible(other)?;
        Ok(Self::transformed(
            "diff",
            Self::retain(store, |key, _| !other.entries.contains_key(key)),
        ))
    }

    /// Returns the entries for which `predicate(key, value)` holds, in order
    pub fn filter<F>(&self, predicate: F) -> Result<Self>
    where
        F: FnMut(&str, &Value) -> bool,
    {
        let store = self.store()?;
        Ok(Self::transformed("filter", Self::retain(store, predicate)))
    }

    fn retain<F>(store: &Store, mut predicate: F) -> Store
    where
        F: FnMut(&str, &Value) -> bool,
    {
        store.derive(
            store
                .entries
                .iter()
                .filter(|&(key, value)| predicate(key.as_str(), value))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }

    /// Returns a map with every value replaced by `transform(value)`
    ///
    /// `transform` receives a copy of each value, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `MapError::InvalidType` for the first transformed value that
    /// is not of a permitted type.
    pub fn map<F, V>(&self, mut transform: F) -> Result<Self>
    where
        F: FnMut(Value) -> V,
        V: Into<Value>,
    {
        let store = self.store()?;
        let mut entries = IndexMap::with_capacity(store.entries.len());
        for (key, value) in &store.entries {
            let mapped = transform(value.clone()).into();
            store.valid_types.check(key, &mapped)?;
            entries.insert(key.clone(), mapped);
        }
        Ok(Self::transformed("map", store.derive(entries)))
    }

    /// Folds the entries, in insertion order, into a single value
    pub fn reduce<A, F>(&self, init: A, mut combine: F) -> Result<A>
    where
        F: FnMut(A, &str, &Value) -> A,
    {
        Ok(self
            .store()?
            .entries
            .iter()
            .fold(init, |acc, (key, value)| combine(acc, key.as_str(), value)))
    }
}

/// Panics if the map is uninitialized or `key` is absent, like `HashMap`
impl Index<&str> for TypedMap {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        match self.store().and_then(|store| store.lookup(key)) {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }
}

impl PartialEq for TypedMap {
    fn eq(&self, other: &Self) -> bool {
        match (&self.store, &other.store) {
            (None, None) => true,
            (Some(left), Some(right)) => {
                left.same_configuration(right) && left.entries == right.entries
            }
            _ => false,
        }
    }
}

impl fmt::Debug for TypedMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.store {
            Some(store) => f.debug_map().entries(store.entries.iter()).finish(),
            None => f.write_str("TypedMap(uninitialized)"),
        }
    }
}

/// Iterator over the entries of a [`TypedMap`], created by [`TypedMap::iter`]
pub struct Iter<'a> {
    inner: indexmap::map::Iter<'a, String, Value>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, value)| (key.as_str(), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(key, value)| (key.as_str(), value))
    }
}

impl ExactSizeIterator for Iter<'_> {}
