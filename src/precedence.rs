//! The override rule shared by all resolvers.
//!
//! A policy-governed field is taken from the first source that provides it:
//!
//! 1. the caller's explicit value,
//! 2. a value computed from other inputs (e.g. a derived dead-letter name),
//! 3. the library default.
//!
//! Resolvers route every overridable field through [`resolve`] or
//! [`or_default`] so the order is spelled out once and covered by tests.

/// Picks `explicit`, then `computed`, then falls back to `default`.
pub fn resolve<T>(explicit: Option<T>, computed: Option<T>, default: impl FnOnce() -> T) -> T {
    match (explicit, computed) {
        (Some(value), _) => value,
        (None, Some(value)) => value,
        (None, None) => default(),
    }
}

/// Shorthand for fields without a computed source.
pub fn or_default<T>(explicit: Option<T>, default: impl FnOnce() -> T) -> T {
    resolve(explicit, None, default)
}

/// Like [`resolve`] but for fields that may legitimately stay empty.
pub fn first_present<T>(explicit: Option<T>, computed: Option<T>) -> Option<T> {
    explicit.or(computed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_wins_over_computed_and_default() {
        assert_eq!(resolve(Some(1), Some(2), || 3), 1);
    }

    #[test]
    fn computed_wins_over_default() {
        assert_eq!(resolve(None, Some(2), || 3), 2);
    }

    #[test]
    fn default_is_the_last_resort() {
        assert_eq!(resolve::<i32>(None, None, || 3), 3);
        assert_eq!(or_default(None, || "default"), "default");
        assert_eq!(or_default(Some("explicit"), || "default"), "explicit");
    }

    #[test]
    fn default_is_only_evaluated_when_needed() {
        let mut evaluated = false;
        let value = resolve(Some(1), None, || {
            evaluated = true;
            0
        });

        assert_eq!(value, 1);
        assert!(!evaluated);
    }

    #[test]
    fn first_present_keeps_absence() {
        assert_eq!(first_present::<&str>(None, None), None);
        assert_eq!(first_present(None, Some("derived")), Some("derived"));
        assert_eq!(first_present(Some("given"), Some("derived")), Some("given"));
    }
}
