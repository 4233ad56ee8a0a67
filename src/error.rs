//! Error types for iBFT encoding

use thiserror::Error;

/// iBFT encoding errors
#[derive(Debug, Error)]
pub enum IbftError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{structure}: flag '{flag}' is unset")]
    UnsetFlag {
        structure: &'static str,
        flag: &'static str,
    },

    #[error("{structure}: {count} flags do not fit in one byte")]
    TooManyFlags { structure: &'static str, count: usize },

    /// A scalar could not be rendered; the traversal attaches the field path.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Heap string {field} is {len} bytes, exceeds the 16-bit length field")]
    StringTooLong { field: String, len: usize },

    #[error("Heap string {field} at offset {offset} is outside 16-bit addressing")]
    HeapOverflow { field: String, offset: usize },

    #[error("{structure}: index must be {expected}, got {got}")]
    InvalidIndex {
        structure: &'static str,
        expected: u8,
        got: u8,
    },

    #[error("Layout error in {structure}: got {got} bytes, want {want}")]
    Layout {
        structure: &'static str,
        got: usize,
        want: usize,
    },
}

impl IbftError {
    /// Attach a field path to a bare [`IbftError::InvalidValue`].
    ///
    /// Other variants already carry their own context and pass through untouched.
    pub fn in_field(self, field: &str) -> Self {
        match self {
            IbftError::InvalidValue(reason) => IbftError::InvalidField {
                field: field.to_string(),
                reason,
            },
            other => other,
        }
    }
}

/// Result type for iBFT operations
pub type IbftResult<T> = Result<T, IbftError>;
