//! Variable arena of a compiled query
//!
//! All typed variables of a query live in one [`VarScope`]. Expressions hold
//! [`VarId`] handles, so copying or inlining a subtree never aliases a
//! descriptor.

use indexmap::IndexMap;
use log::trace;
use xq_types::{QName, SeqType};

use crate::{BindingVar, QueryContext, QueryError, QueryResult, Var, VarId};

/// Arena of variable descriptors, in creation order
#[derive(Debug, Clone, Default)]
pub struct VarScope {
    vars: IndexMap<VarId, Var>,
}

impl VarScope {
    /// Create an empty scope
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, var: Var) -> VarId {
        let id = var.id();
        self.vars.insert(id, var);
        id
    }

    /// Declare a local variable (`let`, `for`, ...)
    pub fn new_local(
        &mut self,
        ctx: &mut QueryContext,
        name: Option<QName>,
        declared: Option<SeqType>,
    ) -> VarId {
        let id = ctx.next_var_id();
        self.insert(Var::new(id, name, declared, false))
    }

    /// Declare a function parameter; parameters apply function conversion
    pub fn new_param(&mut self, ctx: &mut QueryContext, name: QName, declared: Option<SeqType>) -> VarId {
        let id = ctx.next_var_id();
        self.insert(Var::new(id, Some(name), declared, true))
    }

    /// Copy a variable under a fresh identity, e.g. when a function body is inlined
    pub fn copy_var(&mut self, ctx: &mut QueryContext, id: VarId) -> QueryResult<VarId> {
        let copy = self.var(id)?.copy_as(ctx.next_var_id());
        Ok(self.insert(copy))
    }

    /// Convert a pre-resolution binding into a typed variable
    ///
    /// The new variable keeps the binding's name and declared type and is
    /// refined with the static type of the bound expression or cached value.
    pub fn resolve(&mut self, ctx: &mut QueryContext, binding: &BindingVar) -> QueryResult<VarId> {
        let mut var = Var::new(
            ctx.next_var_id(),
            Some(binding.name().clone()),
            binding.declared(),
            false,
        );
        let observed = match (binding.cached(), binding.expr()) {
            (Some(value), _) => Some(value.seq_type()),
            (None, Some(expr)) => Some(expr.static_type()),
            (None, None) => None,
        };
        var.refine_type(observed.as_ref(), ctx, binding.span)?;
        Ok(self.insert(var))
    }

    /// Look up a variable, if it is still in scope
    pub fn get(&self, id: VarId) -> Option<&Var> {
        self.vars.get(&id)
    }

    /// Mutable lookup, e.g. for refinement
    pub fn get_mut(&mut self, id: VarId) -> Option<&mut Var> {
        self.vars.get_mut(&id)
    }

    /// Look up a variable that must exist
    pub fn var(&self, id: VarId) -> QueryResult<&Var> {
        self.get(id)
            .ok_or_else(|| QueryError::internal(format!("unknown variable {}", id)))
    }

    /// Mutable lookup of a variable that must exist
    pub fn var_mut(&mut self, id: VarId) -> QueryResult<&mut Var> {
        self.vars
            .get_mut(&id)
            .ok_or_else(|| QueryError::internal(format!("unknown variable {}", id)))
    }

    /// Most recently declared variable with the given name
    pub fn find(&self, name: &QName) -> Option<&Var> {
        self.vars.values().rev().find(|var| var.name() == Some(name))
    }

    /// Remove a variable whose binding was eliminated
    pub fn remove(&mut self, id: VarId) -> Option<Var> {
        self.vars.shift_remove(&id)
    }

    /// Variables in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Var> {
        self.vars.values()
    }

    /// Number of variables in scope
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Assign consecutive stack slots in declaration order
    ///
    /// Returns the resulting stack size.
    pub fn assign_slots(&mut self) -> usize {
        for (slot, var) in self.vars.values_mut().enumerate() {
            trace!("assigning slot {} to {}", slot, var);
            var.set_slot(slot);
        }
        self.stack_size()
    }

    /// Number of slots required at runtime
    pub fn stack_size(&self) -> usize {
        self.vars.values().filter(|var| var.slot().is_some()).count()
    }
}
