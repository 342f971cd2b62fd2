//! Type system errors

use thiserror::Error;

use crate::SeqType;

/// Errors raised by type parsing and function conversion
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    /// Items of the value cannot be converted to the target item type
    #[error("Cannot promote {from} to {to}")]
    InvalidCast { from: SeqType, to: SeqType },

    /// Number of items does not satisfy the target occurrence indicator
    #[error("Expected {to}, found sequence of {found} item(s)")]
    Cardinality { found: usize, to: SeqType },

    /// Unknown type name in sequence type syntax
    #[error("Unknown type: {0}")]
    UnknownType(String),
}

/// Type conversion result
pub type TypeResult<T> = Result<T, TypeError>;
