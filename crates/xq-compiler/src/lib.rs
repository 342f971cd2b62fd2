//! Variable and type subsystem of the query compiler
//!
//! This crate tracks every variable introduced while compiling a query,
//! reconciles declared types with inferred ones and inserts the minimal
//! runtime checks needed for type safety.
//!
//! # Pipeline
//!
//! Variables pass through two stages:
//!
//! - [`BindingVar`]: the pre-resolution stage. It owns its bound expression
//!   and memoizes the evaluated value.
//! - [`Var`]: the typed-slot stage, stored in a [`VarScope`] arena and
//!   referenced through [`VarId`] handles. [`VarScope::resolve`] is the only
//!   conversion between the two stages.
//!
//! Optimizer passes only use the uniform rewrite surface of [`Expr`]
//! (`uses`, `count`, `removable`, `remove`, `inline`) together with
//! [`Var::refine_type`] and [`Var::adopt_check`]; see [`rewrite`].

pub mod binding;
pub mod context;
pub mod error;
pub mod expr;
pub mod options;
pub mod rewrite;
pub mod scope;
pub mod type_check;
pub mod var;

pub use binding::BindingVar;
pub use context::{QueryContext, Stack};
pub use error::{QueryError, QueryResult};
pub use expr::{Expr, Use, VarRef};
pub use options::CompilerOptions;
pub use scope::VarScope;
pub use type_check::TypeCheck;
pub use var::{Var, VarId, VarPlan};
