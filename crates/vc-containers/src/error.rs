//! Container errors.

use thiserror::Error;

/// Returned by [`ConcurrentStack::pop`](crate::ConcurrentStack::pop) and its
/// variants when the stack holds no elements.
///
/// The pop never blocks and never retries. Callers that want to wait must
/// loop at the call site; checking `is_empty` first does not help, since
/// another thread may pop in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("pop on an empty container")]
pub struct EmptyContainer;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(EmptyContainer.to_string(), "pop on an empty container");
    }

    #[test]
    fn test_is_std_error() {
        fn takes_error(_: &dyn std::error::Error) {}
        takes_error(&EmptyContainer);
    }
}
