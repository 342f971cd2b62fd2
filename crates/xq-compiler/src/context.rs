//! Compilation and evaluation context

use log::debug;
use xq_diagnostics::{Diagnostic, ErrorCode, Span};
use xq_types::Value;

use crate::{CompilerOptions, QueryError, QueryResult, Var, VarId};

/// Runtime storage for variable values, indexed by slot
#[derive(Debug, Clone, Default)]
pub struct Stack {
    slots: Vec<Option<Value>>,
}

impl Stack {
    pub fn with_size(size: usize) -> Self {
        Self {
            slots: vec![None; size],
        }
    }

    /// Grow the stack to hold at least `size` slots
    pub fn ensure(&mut self, size: usize) {
        if self.slots.len() < size {
            self.slots.resize(size, None);
        }
    }

    pub fn set(&mut self, slot: usize, value: Value) {
        self.ensure(slot + 1);
        self.slots[slot] = Some(value);
    }

    pub fn get(&self, slot: usize) -> Option<&Value> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// State shared by all compilation passes of a single query
///
/// Owns the variable id counter, the ambient context value, the runtime
/// stack, and the info diagnostics collected while optimizing.
#[derive(Debug, Default)]
pub struct QueryContext {
    options: CompilerOptions,
    next_var_id: u32,
    context_value: Option<Value>,
    stack: Stack,
    infos: Vec<Diagnostic>,
    traces: Vec<String>,
}

impl QueryContext {
    /// Create a context with default options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Allocate the next variable id; ids are never reused within a context
    pub fn next_var_id(&mut self) -> VarId {
        let id = VarId(self.next_var_id);
        self.next_var_id += 1;
        id
    }

    pub fn context_value(&self) -> Option<&Value> {
        self.context_value.as_ref()
    }

    /// Replace the context value, returning the previous one
    pub fn set_context_value(&mut self, value: Option<Value>) -> Option<Value> {
        std::mem::replace(&mut self.context_value, value)
    }

    /// Run `f` without a context value and restore the previous one afterwards
    ///
    /// The previous value is restored whatever `f` returns.
    pub fn with_isolated_context<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.context_value.take();
        let result = f(self);
        self.context_value = saved;
        result
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut Stack {
        &mut self.stack
    }

    /// Check a value against the variable's type and store it in its slot
    pub fn bind(&mut self, var: &Var, value: Value, span: Span) -> QueryResult<()> {
        let slot = var.slot().ok_or_else(|| QueryError::UnassignedSlot {
            var: var.to_string(),
        })?;
        let value = var.check_type(value, span)?;
        self.stack.set(slot, value);
        Ok(())
    }

    /// Report an applied optimization
    pub fn comp_info(&mut self, code: ErrorCode, message: impl Into<String>) {
        let message = message.into();
        debug!("{}: {}", code, message);
        if self.options.comp_info {
            self.infos.push(Diagnostic::info(code, message));
        }
    }

    /// Info diagnostics collected so far
    pub fn infos(&self) -> &[Diagnostic] {
        &self.infos
    }

    /// Record output of a `trace` expression
    pub fn trace(&mut self, label: &str, value: &Value) {
        self.traces.push(format!("{}{}", label, value));
    }

    pub fn traces(&self) -> &[String] {
        &self.traces
    }
}
