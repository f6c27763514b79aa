use crate::error::{MapError, Result};

/// A fluent precondition check
///
/// Predicates are chained with `satisfies`; the first one that fails turns
/// the assertion false and later ones are skipped. `or_raise` converts a
/// false assertion into the caller's error, carrying the message.
pub(crate) struct Assertion<'a, T: ?Sized> {
    value: &'a T,
    message: &'static str,
    holds: bool,
}

impl<'a, T: ?Sized> Assertion<'a, T> {
    pub(crate) fn that(value: &'a T, message: &'static str) -> Self {
        Self {
            value,
            message,
            holds: true,
        }
    }

    pub(crate) fn satisfies<F>(mut self, predicate: F) -> Self
    where
        F: FnOnce(&T) -> bool,
    {
        if self.holds {
            self.holds = predicate(self.value);
        }
        self
    }

    pub(crate) fn or_raise<E, F>(self, error: F) -> std::result::Result<(), E>
    where
        F: FnOnce(String) -> E,
    {
        if self.holds {
            Ok(())
        } else {
            Err(error(self.message.to_string()))
        }
    }
}

impl Assertion<'_, str> {
    pub(crate) fn non_empty(self) -> Self {
        self.satisfies(|value| !value.is_empty())
    }
}

impl<T> Assertion<'_, [T]> {
    pub(crate) fn non_empty(self) -> Self {
        self.satisfies(|value| !value.is_empty())
    }
}

/// Keys must be non-empty strings
pub(crate) fn key(key: &str) -> Result<()> {
    Assertion::that(key, "keys must be non-empty strings")
        .non_empty()
        .or_raise(MapError::InvalidKey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_stops_at_first_failure() {
        let mut evaluated = false;
        let result = Assertion::that("", "must not be empty")
            .non_empty()
            .satisfies(|_| {
                evaluated = true;
                true
            })
            .or_raise(MapError::InvalidKey);

        assert_eq!(result, Err(MapError::InvalidKey("must not be empty".to_string())));
        assert!(!evaluated);
    }

    #[test]
    fn test_passing_chain() {
        let values = [1, 2, 3];
        let result = Assertion::that(&values[..], "needs three")
            .non_empty()
            .satisfies(|values| values.len() == 3)
            .or_raise(MapError::Configuration);
        assert!(result.is_ok());
    }

    #[test]
    fn test_key_shape() {
        assert!(key("a").is_ok());
        assert!(matches!(key(""), Err(MapError::InvalidKey(_))));
    }
}
