use crate::error::{MapError, Result};
use crate::validate::Assertion;
use crate::value::{Element, Value};
use std::any::{type_name, TypeId};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Clone)]
enum Rule {
    Exact(TypeId),
    Interface,
    // TypeId of the closure type, used for equality
    Predicate(TypeId, Predicate),
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Rule::Exact(left), Rule::Exact(right)) => left == right,
            (Rule::Interface, Rule::Interface) => true,
            (Rule::Predicate(left, _), Rule::Predicate(right, _)) => left == right,
            _ => false,
        }
    }
}

/// One permitted element type of a map
///
/// A permitted type is identified by an opaque, non-empty name. How a value
/// qualifies depends on the constructor:
///
/// - [`ElementType::of`] admits exactly one concrete Rust type
/// - [`ElementType::interface`] admits every element that lists the name in
///   [`Element::interfaces`]
/// - [`ElementType::predicate`] admits every value the predicate accepts
///
/// Two `ElementType`s compare equal when they have the same name and the
/// same membership rule: the same concrete type, both interfaces, or
/// predicates built from the same closure type.
#[derive(Clone)]
pub struct ElementType {
    name: Cow<'static, str>,
    rule: Rule,
}

impl ElementType {
    /// Admits values whose concrete type is `T`
    pub fn of<T: Element>() -> Self {
        Self {
            name: Cow::Borrowed(type_name::<T>()),
            rule: Rule::Exact(TypeId::of::<T>()),
        }
    }

    /// Admits values that declare the interface `name`
    ///
    /// ```
    /// use sovran_typedmap::{Element, ElementType, Value};
    ///
    /// #[derive(Debug, Clone, PartialEq)]
    /// struct Point3 { x: i64, y: i64, z: i64 }
    ///
    /// impl Element for Point3 {
    ///     fn interfaces(&self) -> &'static [&'static str] {
    ///         &["PointLike"]
    ///     }
    /// }
    ///
    /// let point_like = ElementType::interface("PointLike");
    /// assert!(point_like.admits(&Value::new(Point3 { x: 1, y: 2, z: 3 })));
    /// assert!(!point_like.admits(&Value::new("not a point")));
    /// ```
    pub fn interface(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            rule: Rule::Interface,
        }
    }

    /// Admits values accepted by `predicate`
    pub fn predicate<F>(name: impl Into<Cow<'static, str>>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            rule: Rule::Predicate(TypeId::of::<F>(), Arc::new(predicate)),
        }
    }

    /// The declared name of this type
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if `value` is an instance of this type
    pub fn admits(&self, value: &Value) -> bool {
        match &self.rule {
            Rule::Exact(type_id) => value.type_id() == *type_id,
            Rule::Interface => value
                .interfaces()
                .iter()
                .any(|declared| *declared == self.name()),
            Rule::Predicate(_, predicate) => predicate(value),
        }
    }
}

impl PartialEq for ElementType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.rule == other.rule
    }
}

impl Eq for ElementType {}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = match self.rule {
            Rule::Exact(_) => "exact",
            Rule::Interface => "interface",
            Rule::Predicate(..) => "predicate",
        };
        f.debug_struct("ElementType")
            .field("name", &self.name)
            .field("rule", &rule)
            .finish()
    }
}

/// The ordered, non-empty set of types a map permits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSet {
    types: Vec<ElementType>,
}

impl TypeSet {
    /// Builds a type set, keeping declaration order
    ///
    /// # Errors
    ///
    /// Returns `MapError::Configuration` if `types` is empty, if any name is
    /// empty, or if a name is declared twice.
    pub fn new<I>(types: I) -> Result<Self>
    where
        I: IntoIterator<Item = ElementType>,
    {
        let types: Vec<ElementType> = types.into_iter().collect();

        Assertion::that(types.as_slice(), "at least one permitted type is required")
            .non_empty()
            .or_raise(MapError::Configuration)?;

        let mut seen = HashSet::new();
        for element_type in &types {
            Assertion::that(element_type.name(), "permitted type names must be non-empty")
                .non_empty()
                .or_raise(MapError::Configuration)?;
            Assertion::that(element_type.name(), "permitted type declared twice")
                .satisfies(|name| seen.insert(name.to_string()))
                .or_raise(|message| {
                    MapError::Configuration(format!("{}: {}", message, element_type.name()))
                })?;
        }

        Ok(Self { types })
    }

    /// Returns the number of declared types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no types are declared, which never holds for a built set
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates over the declared types in declaration order
    pub fn iter(&self) -> std::slice::Iter<'_, ElementType> {
        self.types.iter()
    }

    /// The declared names, in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.types.iter().map(ElementType::name)
    }

    /// Returns true if a type with this name was declared
    pub fn contains(&self, name: &str) -> bool {
        self.names().any(|declared| declared == name)
    }

    /// Returns true if `value` is an instance of at least one declared type
    pub fn admits(&self, value: &Value) -> bool {
        self.types.iter().any(|element_type| element_type.admits(value))
    }

    /// Checks that `value`, about to be stored under `key`, is admitted
    ///
    /// # Errors
    ///
    /// Returns `MapError::InvalidType` naming the key, the value's type and
    /// the permitted types.
    pub fn check(&self, key: &str, value: &Value) -> Result<()> {
        if self.admits(value) {
            return Ok(());
        }
        log::debug!(
            "Rejected value of type {} under key {:?}; permitted: [{}]",
            value.type_name(),
            key,
            self
        );
        Err(MapError::InvalidType {
            key: key.to_string(),
            found: value.type_name(),
            expected: self.to_string(),
        })
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, name) in self.names().enumerate() {
            if index > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a TypeSet {
    type Item = &'a ElementType;
    type IntoIter = std::slice::Iter<'a, ElementType>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
