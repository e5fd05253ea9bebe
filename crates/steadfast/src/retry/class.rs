//! Failure-taxonomy seam for typed retry eligibility.

use std::fmt;

/// Classification of failures into retry-eligibility classes.
///
/// A [`RetryPolicy`](crate::retry::RetryPolicy) restricted with `retry_on`
/// decides eligibility by asking the failure which class it belongs to. The
/// check is a typed tag comparison, never an inspection of rendered error
/// messages.
///
/// The default [`is_within`](Classify::is_within) is plain discriminant
/// equality. Override it to model a class hierarchy, where a specific class
/// also counts as a member of a broader one:
///
/// ```rust
/// use steadfast::retry::Classify;
///
/// #[derive(Debug, thiserror::Error)]
/// enum StoreError {
///     #[error("connection reset by peer")]
///     ConnectionReset,
///     #[error("corrupt record at offset {0}")]
///     CorruptRecord(u64),
/// }
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum StoreClass {
///     /// Any network-level failure.
///     Network,
///     /// A reset specifically; counts as `Network` too.
///     ConnectionReset,
///     Corruption,
/// }
///
/// impl Classify for StoreError {
///     type Class = StoreClass;
///
///     fn class(&self) -> StoreClass {
///         match self {
///             StoreError::ConnectionReset => StoreClass::ConnectionReset,
///             StoreError::CorruptRecord(_) => StoreClass::Corruption,
///         }
///     }
///
///     fn is_within(&self, class: StoreClass) -> bool {
///         self.class() == class
///             || (self.class() == StoreClass::ConnectionReset && class == StoreClass::Network)
///     }
/// }
/// ```
pub trait Classify {
    /// The tag type used for retry-eligibility checks.
    type Class: Copy + PartialEq + fmt::Debug + Send + Sync;

    /// The class this failure belongs to.
    fn class(&self) -> Self::Class;

    /// Whether this failure falls under `class`, directly or as a refinement
    /// of it.
    fn is_within(&self, class: Self::Class) -> bool {
        self.class() == class
    }
}

/// I/O errors classify by their [`std::io::ErrorKind`].
impl Classify for std::io::Error {
    type Class = std::io::ErrorKind;

    fn class(&self) -> std::io::ErrorKind {
        self.kind()
    }
}
