//! Error type shared by every parcial crate that manipulates Partials.

use alloc::string::String;

/// Errors raised by Partial construction, transformation, and synthesis.
///
/// Every fallible operation validates its arguments before touching any
/// Partial, so an `Err` always means nothing was modified.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A rate, interval, time, label, or array argument is out of range.
    InvalidArgument(String),
    /// A Partial cannot be processed (no Breakpoints, negative start time).
    InvalidPartial(String),
    /// A search found nothing that satisfies its constraints.
    NoCandidate(String),
    /// An iterative refinement did not converge.
    IteratorLimit(String),
    /// A Breakpoint index is past the end of a Partial.
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Number of Breakpoints in the Partial.
        len: usize,
    },
}

impl Error {
    /// Create an invalid-argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Create an invalid-partial error.
    pub fn invalid_partial(msg: impl Into<String>) -> Self {
        Error::InvalidPartial(msg.into())
    }

    /// Create a no-candidate error.
    pub fn no_candidate(msg: impl Into<String>) -> Self {
        Error::NoCandidate(msg.into())
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::InvalidPartial(msg) => write!(f, "invalid partial: {msg}"),
            Self::NoCandidate(msg) => write!(f, "no candidate: {msg}"),
            Self::IteratorLimit(msg) => write!(f, "iteration limit reached: {msg}"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "breakpoint index {index} out of bounds for partial of length {len}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Convenience result type for Partial operations.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_factory_variants() {
        assert!(matches!(
            Error::invalid_argument("x"),
            Error::InvalidArgument(ref m) if m == "x"
        ));
        assert!(matches!(
            Error::invalid_partial("y"),
            Error::InvalidPartial(ref m) if m == "y"
        ));
        assert!(matches!(
            Error::no_candidate("z"),
            Error::NoCandidate(ref m) if m == "z"
        ));
    }

    #[test]
    fn test_display() {
        let msg = Error::invalid_argument("sample rate must be positive").to_string();
        assert_eq!(msg, "invalid argument: sample rate must be positive");

        let msg = Error::IndexOutOfBounds { index: 4, len: 2 }.to_string();
        assert!(msg.contains("index 4"), "got: {msg}");
        assert!(msg.contains("length 2"), "got: {msg}");
    }
}
