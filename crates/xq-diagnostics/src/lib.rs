//! Diagnostics for the query compiler
//!
//! Error codes, source spans and the diagnostic records that the compiler
//! hands to the surrounding reporting layer.

mod diagnostic;
mod error_code;
mod span;

pub use diagnostic::*;
pub use error_code::*;
pub use span::*;
