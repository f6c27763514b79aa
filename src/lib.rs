//! # sovran-typedmap
//!
//! An immutable, copy-on-write map with runtime-enforced element types.
//!
//! `sovran-typedmap` provides a building block for domain objects that must
//! never change once built: collections of events, aggregates, value objects.
//! A [`TypedMap`] maps non-empty string keys to values, and every value must
//! be an instance of one of the map's permitted types. Operations that look
//! like mutations return a new map; the original is never touched.
//!
//! ## Key Features
//!
//! - **Immutable**: `with`, `without`, `merge`, `filter` and friends all return new maps
//! - **Type-checked**: Values are checked against a declared set of permitted types
//! - **Polymorphic**: A permitted type can be a concrete type, a named interface, or a predicate
//! - **Ordered**: Iteration follows insertion order
//! - **Copy-safe**: Values cross the map boundary as copies, never as shared mutable references
//!
//! ## Usage Examples
//!
//! ### Basic Usage
//!
//! ```rust
//! use sovran_typedmap::{Element, ElementType, MapError, TypedMap};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Point {
//!     x: i64,
//!     y: i64,
//! }
//!
//! impl Element for Point {}
//!
//! fn main() -> Result<(), MapError> {
//!     let points = TypedMap::new(
//!         [("origin", Point { x: 0, y: 0 })],
//!         [ElementType::of::<Point>()],
//!     )?;
//!
//!     // Every "mutation" produces a new map
//!     let more = points.with("corner", Point { x: 1, y: 1 })?;
//!
//!     println!("Before: {:?}", points.keys()?);
//!     println!("After: {:?}", more.keys()?);
//!
//!     // Reads hand out copies
//!     let corner: Point = more.get_as("corner")?;
//!     println!("Corner: {:?}", corner);
//!
//!     // Handle errors properly
//!     match more.get("nowhere") {
//!         Ok(value) => println!("Value: {:?}", value),
//!         Err(MapError::KeyNotFound(key)) => println!("Key ({}) doesn't exist", key),
//!         Err(e) => println!("Other error: {}", e),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Polymorphic Membership
//!
//! Rust has no inheritance, so elements declare the interfaces they satisfy
//! by name, and a map can permit an interface instead of a concrete type.
//!
//! ```rust
//! use sovran_typedmap::{Element, ElementType, MapError, TypedMap};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Point { x: i64, y: i64 }
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Point3 { x: i64, y: i64, z: i64 }
//!
//! impl Element for Point {
//!     fn interfaces(&self) -> &'static [&'static str] { &["PointLike"] }
//! }
//!
//! impl Element for Point3 {
//!     fn interfaces(&self) -> &'static [&'static str] { &["PointLike"] }
//! }
//!
//! let shapes = TypedMap::from_types([ElementType::interface("PointLike")])?
//!     .with("flat", Point { x: 1, y: 2 })?
//!     .with("deep", Point3 { x: 1, y: 2, z: 3 })?;
//!
//! assert_eq!(shapes.count()?, 2);
//! assert_eq!(shapes.find(&Point3 { x: 1, y: 2, z: 3 })?, Some("deep".to_string()));
//! assert!(shapes.with("text", "not a point").is_err());
//! # Ok::<(), MapError>(())
//! ```
//!
//! ### Set-like Operations
//!
//! ```rust
//! use sovran_typedmap::{ElementType, MapError, TypedMap};
//!
//! let a = TypedMap::new([("a", 1i64), ("b", 2)], [ElementType::of::<i64>()])?;
//! let b = TypedMap::new([("b", 3i64), ("c", 4)], [ElementType::of::<i64>()])?;
//!
//! // The argument wins on collisions
//! let merged = a.merge(&b)?;
//! assert_eq!(merged.get_as::<i64>("b")?, 3);
//!
//! assert_eq!(a.intersect(&b)?.keys()?, vec!["b"]);
//! assert_eq!(a.diff(&b)?.keys()?, vec!["a"]);
//!
//! let total = merged.reduce(0, |sum, _, value| {
//!     sum + value.downcast_ref::<i64>().copied().unwrap_or_default()
//! })?;
//! assert_eq!(total, 8);
//! # Ok::<(), MapError>(())
//! ```
//!
//! ### Error Handling
//!
//! ```rust
//! use sovran_typedmap::{ElementType, MapError, TypedMap};
//!
//! let mut map = TypedMap::uninit();
//!
//! // Nothing works before initialization
//! assert_eq!(map.count(), Err(MapError::Uninitialized));
//!
//! map.init([("answer", 42i32)], [ElementType::of::<i32>()]).unwrap();
//!
//! // ...and initialization happens once
//! match map.init([("question", 0i32)], [ElementType::of::<i32>()]) {
//!     Err(MapError::Reinitialized) => println!("Already initialized"),
//!     other => println!("Unexpected: {:?}", other),
//! }
//!
//! // Try to store a value of the wrong type
//! match map.with("name", "Deep Thought") {
//!     Ok(_) => println!("Stored"),
//!     Err(MapError::InvalidType { key, found, .. }) => {
//!         println!("{} can't hold a {}", key, found)
//!     }
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```

mod error;
mod map;
mod typed;
mod types;
mod validate;
mod value;
mod variant;

pub use error::{MapError, Result};
pub use map::{Iter, TypedMap};
pub use typed::TypedMapV;
pub use types::{ElementType, TypeSet};
pub use value::{DynElement, Element, Value};
pub use variant::MapVariant;
