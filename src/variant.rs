use crate::types::ElementType;

/// A named, fixed map configuration
///
/// A variant pins down the permitted types once so call sites don't repeat
/// them. Maps built with [`TypedMap::of_variant`](crate::TypedMap::of_variant)
/// remember the variant's name, and binary operations only combine maps of
/// the same variant.
///
/// # Examples
///
/// ```
/// use sovran_typedmap::{Element, ElementType, MapError, MapVariant, TypedMap};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Deposited { amount: u64 }
/// impl Element for Deposited {}
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Withdrawn { amount: u64 }
/// impl Element for Withdrawn {}
///
/// struct LedgerEvents;
///
/// impl MapVariant for LedgerEvents {
///     const NAME: &'static str = "LedgerEvents";
///
///     fn valid_types() -> Vec<ElementType> {
///         vec![ElementType::of::<Deposited>(), ElementType::of::<Withdrawn>()]
///     }
/// }
///
/// let events = TypedMap::of_variant::<LedgerEvents, _, _, _>([
///     ("e1", Deposited { amount: 100 }),
/// ])?;
/// let events = events.with("e2", Withdrawn { amount: 40 })?;
///
/// assert_eq!(events.variant()?, Some("LedgerEvents"));
/// assert_eq!(events.keys()?, vec!["e1", "e2"]);
/// assert!(events.with("e3", 40u64).is_err());
/// # Ok::<(), MapError>(())
/// ```
pub trait MapVariant {
    /// Identifies the configuration in error messages and compatibility checks
    const NAME: &'static str;

    /// The permitted types, in declaration order
    fn valid_types() -> Vec<ElementType>;
}
