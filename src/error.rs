use thiserror::Error;

/// Errors that can occur when building or querying a typed map
///
/// Every variant is a precondition violation: the operation that raised it
/// did not produce a new map and left its receiver untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// `init` was called on a map that already holds a store
    #[error("Map is already initialized")]
    Reinitialized,

    /// The permitted type set is empty or contains an invalid entry
    #[error("Invalid map configuration: {0}")]
    Configuration(String),

    /// A key was not a non-empty string
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// A value is not an instance of any permitted type
    #[error("Value of type {found} under key {key:?} is not one of [{expected}]")]
    InvalidType {
        key: String,
        found: &'static str,
        expected: String,
    },

    /// The requested key was not found
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// An operation other than `init` was called before initialization
    #[error("Map is not initialized")]
    Uninitialized,

    /// A binary operation received a map with a different configuration
    #[error("Cannot combine map configured as {left} with map configured as {right}")]
    IncompatibleMaps { left: String, right: String },

    /// `first` or `last` was called on an empty map
    #[error("Map is empty")]
    EmptyMap,

    /// A stored value was read back as a type it does not have
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = MapError::InvalidType {
            key: "x".to_string(),
            found: "&str",
            expected: "Point".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Value of type &str under key \"x\" is not one of [Point]"
        );
        assert_eq!(
            MapError::KeyNotFound("missing".to_string()).to_string(),
            "Key not found: missing"
        );
    }
}
