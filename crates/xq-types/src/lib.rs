//! Sequence type system for the query compiler
//!
//! This crate defines:
//! - Qualified names
//! - Item types and their subtype hierarchy
//! - Occurrence indicators and their cardinality algebra
//! - Sequence types (the lattice used for variable typing)
//! - Runtime items and values, and function conversion between them

mod conversion;
mod error;
mod item_type;
mod occurrence;
mod qname;
mod seq_type;
mod value;

pub use error::{TypeError, TypeResult};
pub use item_type::ItemType;
pub use occurrence::Occurrence;
pub use qname::QName;
pub use seq_type::SeqType;
pub use value::{Item, Node, NodeKind, Value};
