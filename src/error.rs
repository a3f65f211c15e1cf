//! Engine error taxonomy.
//!
//! Nothing in the engine treats a failure as fatal: malformed paths resolve
//! to `None`, validation failures are data on the field's `error` cell, and
//! the conditions below are reported `Err` values that leave state untouched.

/// Errors reported by mutating form operations.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// `save()` or forward navigation refused because validation failed.
    #[error("form has validation errors")]
    Invalid,

    /// An array item or step index outside the valid range.
    #[error("index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A path that did not resolve to a field.
    #[error("path `{0}` did not resolve to a field")]
    Unresolved(String),
}
