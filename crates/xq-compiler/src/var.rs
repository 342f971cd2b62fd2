//! Typed variable descriptors
//!
//! A [`Var`] is the post-resolution form of a variable. It keeps the
//! user-declared type apart from the type inferred by static analysis:
//! - [`Var::refine_type`] narrows the inferred type and drops the declared
//!   type once it is provably redundant
//! - [`Var::checked`] wraps bound expressions in a runtime check only while a
//!   declared type remains
//! - [`Var::check_type`] enforces the declared type on runtime values

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use xq_diagnostics::{Span, XQC0500};
use xq_types::{QName, SeqType, Value};

use crate::type_check::check_value;
use crate::{Expr, QueryContext, QueryError, QueryResult, TypeCheck};

/// Identity of a variable, unique within one [`QueryContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub u32);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Query plan entry of a variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarPlan<'a> {
    pub name: String,
    pub id: VarId,
    #[serde(rename = "as", skip_serializing_if = "Option::is_none")]
    pub declared: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub global: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub explicit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expr: Option<&'a Expr>,
}

fn is_false(flag: &bool) -> bool {
    !flag
}

/// Variable descriptor
///
/// Equality and hashing only consider [`Var::id`].
#[derive(Debug, Clone)]
pub struct Var {
    id: VarId,
    name: Option<QName>,
    /// Declared type; `None` once the declaration is unconstrained or redundant
    declared: Option<SeqType>,
    inferred: SeqType,
    slot: Option<usize>,
    size: Option<usize>,
    param: bool,
    promote: bool,
}

impl Var {
    pub(crate) fn new(id: VarId, name: Option<QName>, declared: Option<SeqType>, param: bool) -> Self {
        Self {
            id,
            name,
            declared,
            inferred: SeqType::ITEM_ZM,
            slot: None,
            size: None,
            param,
            promote: param,
        }
    }

    /// Copy all type information into a descriptor with a new identity
    pub(crate) fn copy_as(&self, id: VarId) -> Self {
        Self {
            id,
            slot: None,
            ..self.clone()
        }
    }

    /// Identity of the variable
    pub fn id(&self) -> VarId {
        self.id
    }

    /// Name of the variable; compiler-generated variables have none
    pub fn name(&self) -> Option<&QName> {
        self.name.as_ref()
    }

    /// Whether the variable is a function parameter
    pub fn is_param(&self) -> bool {
        self.param
    }

    /// Whether bound values are converted instead of rejected
    pub fn promotes(&self) -> bool {
        self.promote
    }

    /// Stack slot, once assigned by [`VarScope::assign_slots`](crate::VarScope::assign_slots)
    pub fn slot(&self) -> Option<usize> {
        self.slot
    }

    pub(crate) fn set_slot(&mut self, slot: usize) {
        self.slot = Some(slot);
    }

    /// Expected number of items, if the working type fixes it
    pub fn size(&self) -> Option<usize> {
        self.size
    }

    /// Declared type, if any constraint remains
    pub fn declared(&self) -> Option<SeqType> {
        self.declared
    }

    /// Type inferred by static analysis, `item()*` until refined
    pub fn inferred(&self) -> SeqType {
        self.inferred
    }

    /// Effective type of the variable
    pub fn seq_type(&self) -> SeqType {
        match self.declared {
            Some(declared) => declared.intersect(&self.inferred).unwrap_or(declared),
            None => self.inferred,
        }
    }

    /// Declared type, or `item()*` if the variable is unconstrained
    pub fn declared_type(&self) -> SeqType {
        self.declared.unwrap_or(SeqType::ITEM_ZM)
    }

    /// Narrow the inferred type with a newly observed static type
    ///
    /// Never widens the inferred type, so repeated calls are safe. Fails if
    /// the observed cardinality can never satisfy the declared type.
    pub fn refine_type(
        &mut self,
        observed: Option<&SeqType>,
        ctx: &mut QueryContext,
        span: Span,
    ) -> QueryResult<()> {
        let Some(observed) = observed else {
            return Ok(());
        };

        if let Some(declared) = self.declared {
            if !declared.occ.intersects(observed.occ) {
                return Err(QueryError::incompatible_cast(declared, *observed, span));
            }
            if !observed.convertible_to(&declared) {
                return Ok(());
            }
        }

        if self.inferred.instance_of(observed) {
            return Ok(());
        }
        let Some(narrowed) = self.inferred.intersect(observed) else {
            return Ok(());
        };
        self.inferred = narrowed;
        self.size = narrowed.size();

        if let Some(declared) = self.declared {
            if narrowed.instance_of(&declared) {
                self.declared = None;
                ctx.comp_info(XQC0500, format!("removing redundant type check of {}", self.label()));
            }
        }
        Ok(())
    }

    /// Whether values bound to this variable still need a runtime check
    pub fn checks_type(&self) -> bool {
        self.declared.is_some()
    }

    /// Wrap an expression in the runtime check of this variable
    pub fn checked(&self, expr: Expr, ctx: &mut QueryContext, span: Span) -> QueryResult<Expr> {
        match self.declared {
            Some(declared) => TypeCheck::new(expr, declared, self.promote, span).optimize(ctx),
            None => Ok(expr),
        }
    }

    /// Check a runtime value against the declared type, converting it if allowed
    pub fn check_type(&self, value: Value, span: Span) -> QueryResult<Value> {
        match self.declared {
            Some(declared) => check_value(&declared, self.promote, value, span),
            None => Ok(value),
        }
    }

    /// Merge an external type check into the declared type
    ///
    /// Succeeds if one of the types is an instance of the other; the narrower
    /// type is kept and conversion is required if either side required it.
    pub fn adopt_check(&mut self, candidate: SeqType, promote: bool) -> QueryResult<()> {
        match self.declared {
            None => self.declared = Some(candidate),
            Some(declared) if candidate.instance_of(&declared) => self.declared = Some(candidate),
            Some(declared) if declared.instance_of(&candidate) => {}
            Some(declared) => {
                return Err(QueryError::IncomparableTypeMerge {
                    declared,
                    candidate,
                });
            }
        }
        self.promote |= promote;
        debug!("{} adopted check, declared type is now {}", self.label(), self.declared_type());
        Ok(())
    }

    /// Whether both descriptors denote the same variable
    pub fn is(&self, other: &Var) -> bool {
        self.id == other.id
    }

    /// Query plan entry with name, id and remaining declared type
    pub fn plan(&self) -> VarPlan<'static> {
        VarPlan {
            name: self.label(),
            id: self.id,
            declared: self.declared.map(|t| t.to_string()),
            global: false,
            explicit: false,
            expr: None,
        }
    }

    /// Name with `$` prefix, or the id for unnamed variables
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("${}", name),
            None => format!("${}", self.id),
        }
    }
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Var {}

impl Hash for Var {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())?;
        if let Some(declared) = self.declared {
            write!(f, " as {}", declared)?;
        }
        Ok(())
    }
}
