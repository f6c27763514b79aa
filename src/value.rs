use std::any::{type_name, Any, TypeId};
use std::fmt;

/// A type that may be stored in a [`TypedMap`](crate::TypedMap)
///
/// Implementing `Element` is an explicit opt-in. The type must also be
/// `Clone + PartialEq`: cloning is how the map copies values in and out, and
/// equality is what [`TypedMap::find`](crate::TypedMap::find) compares with.
///
/// Rust has no inheritance, so a type declares the abstract "interfaces" it
/// satisfies by name. A permitted type built with
/// [`ElementType::interface`](crate::ElementType::interface) admits every
/// element that lists that name.
///
/// ```
/// use sovran_typedmap::Element;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Point { x: i64, y: i64 }
///
/// impl Element for Point {
///     fn interfaces(&self) -> &'static [&'static str] {
///         &["PointLike"]
///     }
/// }
/// ```
pub trait Element: Any + fmt::Debug + Send + Sync + DynElement {
    /// Names of the interfaces this element satisfies
    fn interfaces(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Object-safe operations behind [`Element`]
///
/// Implemented automatically for every `Element + Clone + PartialEq`; there
/// is no reason to implement it by hand.
pub trait DynElement {
    fn clone_element(&self) -> Box<dyn Element>;
    fn eq_element(&self, other: &dyn Element) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn element_type_name(&self) -> &'static str;
}

impl<T> DynElement for T
where
    T: Element + Clone + PartialEq,
{
    fn clone_element(&self) -> Box<dyn Element> {
        Box::new(self.clone())
    }

    fn eq_element(&self, other: &dyn Element) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn element_type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

macro_rules! impl_element {
    ($($ty:ty),* $(,)?) => {
        $(impl Element for $ty {})*
    };
}

impl_element!(
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
);

impl<T: Element + Clone + PartialEq> Element for Vec<T> {}

impl<T: Element + Clone + PartialEq> Element for Option<T> {}

/// An owned, type-erased element
///
/// `Value` is what crosses the map boundary. Cloning a `Value` clones the
/// element it holds, so a `Value` handed out by the map never aliases the
/// map's own copy.
pub struct Value {
    inner: Box<dyn Element>,
}

impl Value {
    /// Wraps an element
    pub fn new<T: Element>(value: T) -> Self {
        Self {
            inner: Box::new(value),
        }
    }

    /// Borrows the wrapped element
    pub fn as_element(&self) -> &dyn Element {
        &*self.inner
    }

    /// The `TypeId` of the wrapped element's concrete type
    pub fn type_id(&self) -> TypeId {
        self.as_element().as_any().type_id()
    }

    /// The name of the wrapped element's concrete type
    pub fn type_name(&self) -> &'static str {
        self.as_element().element_type_name()
    }

    /// The interfaces the wrapped element declares
    pub fn interfaces(&self) -> &'static [&'static str] {
        self.as_element().interfaces()
    }

    /// Returns true if the wrapped element equals `other`
    ///
    /// Elements of different concrete types are never equal.
    pub fn equals(&self, other: &dyn Element) -> bool {
        self.as_element().eq_element(other)
    }

    /// Check if the wrapped element is of type T
    pub fn is<T: Any>(&self) -> bool {
        self.as_element().as_any().is::<T>()
    }

    /// Get a reference to the wrapped element if it is of type T
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_element().as_any().downcast_ref::<T>()
    }

    /// Get a mutable reference to the wrapped element if it is of type T
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        (*self.inner).as_any_mut().downcast_mut::<T>()
    }

    /// Unwraps the element as a `T`
    ///
    /// # Errors
    ///
    /// Returns the value unchanged if the element is not a `T`.
    pub fn downcast<T: Element>(self) -> Result<T, Value> {
        if !self.is::<T>() {
            return Err(self);
        }
        match self.inner.into_any().downcast::<T>() {
            Ok(boxed) => Ok(*boxed),
            Err(_) => unreachable!("type checked above"),
        }
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        Self {
            inner: self.as_element().clone_element(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.as_element().eq_element(other.as_element())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_element(), f)
    }
}

impl<T: Element> From<T> for Value {
    fn from(value: T) -> Self {
        Value::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl Element for Point {
        fn interfaces(&self) -> &'static [&'static str] {
            &["PointLike"]
        }
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Value::new(Point { x: 1, y: 1 });
        let mut copy = original.clone();

        copy.downcast_mut::<Point>().unwrap().x = 99;

        assert_eq!(original.downcast_ref::<Point>().unwrap().x, 1);
        assert_ne!(original, copy);
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(Value::new(Point { x: 1, y: 2 }), Value::new(Point { x: 1, y: 2 }));
        assert_ne!(Value::new(1i64), Value::new(1i32));
        assert_ne!(Value::new("a".to_string()), Value::new("a"));
    }

    #[test]
    fn test_type_information() {
        let value = Value::from(Point { x: 0, y: 0 });
        assert!(value.is::<Point>());
        assert!(!value.is::<String>());
        assert_eq!(value.type_id(), TypeId::of::<Point>());
        assert!(value.type_name().ends_with("Point"));
        assert_eq!(value.interfaces(), &["PointLike"]);
        assert!(Value::new(5u8).interfaces().is_empty());
    }

    #[test]
    fn test_downcast() {
        let point = Value::new(Point { x: 3, y: 4 }).downcast::<Point>();
        assert_eq!(point, Ok(Point { x: 3, y: 4 }));

        let original = Value::new(3i32);
        match original.clone().downcast::<String>() {
            Err(value) => assert_eq!(value, original),
            other => panic!("Expected the value back, got {:?}", other),
        }
    }

    #[test]
    fn test_containers_of_elements() {
        let list = Value::new(vec![Some(1u32), None]);
        assert_eq!(list.clone(), list);
        assert_eq!(format!("{:?}", list), "[Some(1), None]");
    }
}
