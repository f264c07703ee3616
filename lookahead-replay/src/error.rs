//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
///
/// Every variant is a contract violation by the caller. An operation returning
/// one of these leaves the buffer untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReplayError {
    /// Non-positive capacity, malformed shape or malformed schema.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A value's shape disagrees with the shape declared for its field.
    #[error("Shape mismatch in field {field}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Name of the field.
        field: String,
        /// Declared shape.
        expected: Vec<usize>,
        /// Shape of the given value.
        actual: Vec<usize>,
    },

    /// The set of fields of a transition disagrees with the schema.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A logical index is not smaller than the current length.
    #[error("Index {idx} out of range for length {len}")]
    IndexOutOfRange {
        /// Requested logical index.
        idx: usize,
        /// Current number of stored elements.
        len: usize,
    },

    /// Sampling was requested before anything was appended.
    #[error("Sampling from an empty store")]
    EmptyStore,
}

/// Result type of the core operations.
pub type Result<T> = std::result::Result<T, ReplayError>;
