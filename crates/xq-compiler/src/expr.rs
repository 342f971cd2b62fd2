//! Expressions and their rewrite hooks
//!
//! Optimizer passes manipulate variables only through the hooks defined here:
//! - [`Expr::uses`]: capability detection
//! - [`Expr::count`]: reference counting for dead binding elimination
//! - [`Expr::removable`] and [`Expr::remove`]: replacing references by the
//!   context item
//! - [`Expr::inline`]: substitution of a bound expression

use log::trace;
use serde::Serialize;
use std::fmt;
use xq_diagnostics::Span;
use xq_types::{QName, SeqType, Value};

use crate::{QueryContext, QueryError, QueryResult, TypeCheck, Var, VarId, VarScope};

/// Capabilities an expression may depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Use {
    /// References a variable
    Var,
    /// Performs updates
    Update,
    /// Reads the context item
    Context,
    /// Has observable side effects or varying results
    NonDeterministic,
}

/// Reference to a variable
///
/// Captures the variable's type at creation time and its slot once
/// [`Expr::resolve_slots`] has run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarRef {
    pub var: VarId,
    pub name: Option<QName>,
    pub seq_type: SeqType,
    pub slot: Option<usize>,
    pub span: Span,
}

impl VarRef {
    pub fn new(var: &Var, span: Span) -> Self {
        Self {
            var: var.id(),
            name: var.name().cloned(),
            seq_type: var.seq_type(),
            slot: var.slot(),
            span,
        }
    }

    fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("${}", name),
            None => format!("${}", self.var),
        }
    }
}

/// Expression tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// Pre-evaluated value
    Value(Value),
    /// The context item `.`
    ContextItem { span: Span },
    VarRef(VarRef),
    /// Comma-separated sequence of expressions
    Seq(Vec<Expr>),
    TypeCheck(Box<TypeCheck>),
    /// Returns its operand and records it in the trace output
    Trace { expr: Box<Expr>, label: String },
    /// Updating expression; evaluates its target and yields the empty sequence
    Update { target: Box<Expr>, span: Span },
}

impl Expr {
    pub fn value_of(value: impl Into<Value>) -> Self {
        Expr::Value(value.into())
    }

    pub fn context_item(span: Span) -> Self {
        Expr::ContextItem { span }
    }

    pub fn var_ref(var: &Var, span: Span) -> Self {
        Expr::VarRef(VarRef::new(var, span))
    }

    pub fn trace(expr: Expr, label: impl Into<String>) -> Self {
        Expr::Trace {
            expr: Box::new(expr),
            label: label.into(),
        }
    }

    pub fn update(target: Expr, span: Span) -> Self {
        Expr::Update {
            target: Box::new(target),
            span,
        }
    }

    /// Whether this expression is already a value
    pub fn is_value(&self) -> bool {
        matches!(self, Expr::Value(_))
    }

    fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Value(_) | Expr::ContextItem { .. } | Expr::VarRef(_) => Vec::new(),
            Expr::Seq(exprs) => exprs.iter().collect(),
            Expr::TypeCheck(check) => vec![&check.expr],
            Expr::Trace { expr, .. } => vec![expr.as_ref()],
            Expr::Update { target, .. } => vec![target.as_ref()],
        }
    }

    /// Rebuild this expression with `f` applied to every direct operand
    fn map_children(self, f: &mut impl FnMut(Expr) -> Expr) -> Expr {
        match self {
            Expr::Seq(exprs) => Expr::Seq(exprs.into_iter().map(|e| f(e)).collect()),
            Expr::TypeCheck(check) => {
                let TypeCheck {
                    expr,
                    seq_type,
                    promote,
                    span,
                } = *check;
                Expr::TypeCheck(Box::new(TypeCheck::new(f(expr), seq_type, promote, span)))
            }
            Expr::Trace { expr, label } => Expr::Trace {
                expr: Box::new(f(*expr)),
                label,
            },
            Expr::Update { target, span } => Expr::Update {
                target: Box::new(f(*target)),
                span,
            },
            leaf => leaf,
        }
    }

    /// Check if this expression or one of its operands has the capability
    pub fn uses(&self, u: Use) -> bool {
        let own = match self {
            Expr::ContextItem { .. } => u == Use::Context,
            Expr::VarRef(_) => u == Use::Var,
            Expr::Trace { .. } => u == Use::NonDeterministic,
            Expr::Update { .. } => u == Use::Update,
            _ => false,
        };
        own || self.children().into_iter().any(|e| e.uses(u))
    }

    /// Number of references to `var`
    pub fn count(&self, var: VarId) -> usize {
        match self {
            Expr::VarRef(r) if r.var == var => 1,
            _ => self.children().into_iter().map(|e| e.count(var)).sum(),
        }
    }

    /// Whether references to `var` may be replaced by the context item
    pub fn removable(&self, var: VarId) -> bool {
        match self {
            Expr::ContextItem { .. } => false,
            Expr::Update { .. } => self.count(var) == 0,
            _ => self.children().into_iter().all(|e| e.removable(var)),
        }
    }

    /// Replace references to `var` by the context item
    pub fn remove(self, var: VarId) -> Expr {
        match self {
            Expr::VarRef(r) if r.var == var => Expr::ContextItem { span: r.span },
            expr => expr.map_children(&mut |e| e.remove(var)),
        }
    }

    /// Substitute `replacement` for every reference to `var`
    pub fn inline(self, var: VarId, replacement: &Expr) -> Expr {
        match self {
            Expr::VarRef(r) if r.var == var => replacement.clone(),
            expr => expr.map_children(&mut |e| e.inline(var, replacement)),
        }
    }

    /// Fill in the slots of variable references after slot assignment
    pub fn resolve_slots(self, scope: &VarScope) -> Expr {
        match self {
            Expr::VarRef(mut r) => {
                if let Some(var) = scope.get(r.var) {
                    r.slot = var.slot();
                    r.seq_type = var.seq_type();
                }
                Expr::VarRef(r)
            }
            expr => expr.map_children(&mut |e| e.resolve_slots(scope)),
        }
    }

    /// Static type of the result
    pub fn static_type(&self) -> SeqType {
        match self {
            Expr::Value(value) => value.seq_type(),
            Expr::ContextItem { .. } => SeqType::ITEM,
            Expr::VarRef(r) => r.seq_type,
            Expr::Seq(exprs) => exprs
                .iter()
                .fold(SeqType::EMPTY, |acc, e| acc.concat(&e.static_type())),
            Expr::TypeCheck(check) => check.static_type(),
            Expr::Trace { expr, .. } => expr.static_type(),
            Expr::Update { .. } => SeqType::EMPTY,
        }
    }

    /// Compile a freshly built expression
    pub fn compile(self, ctx: &mut QueryContext) -> QueryResult<Expr> {
        self.optimize(ctx)
    }

    /// Simplify this expression bottom-up
    ///
    /// Sequences of values are merged, nested sequences are flattened and
    /// type checks are optimized.
    pub fn optimize(self, ctx: &mut QueryContext) -> QueryResult<Expr> {
        match self {
            Expr::Seq(exprs) => {
                let mut flat = Vec::with_capacity(exprs.len());
                for expr in exprs {
                    match expr.optimize(ctx)? {
                        Expr::Seq(inner) => flat.extend(inner),
                        Expr::Value(value) if value.is_empty() => {}
                        expr => flat.push(expr),
                    }
                }
                if flat.iter().all(Expr::is_value) {
                    let value = flat.into_iter().fold(Value::empty(), |acc, e| match e {
                        Expr::Value(v) => acc.concat(v),
                        _ => acc,
                    });
                    return Ok(Expr::Value(value));
                }
                if flat.len() == 1 {
                    if let Some(single) = flat.pop() {
                        return Ok(single);
                    }
                }
                Ok(Expr::Seq(flat))
            }
            Expr::TypeCheck(check) => check.optimize(ctx),
            Expr::Trace { expr, label } => Ok(Expr::Trace {
                expr: Box::new(expr.optimize(ctx)?),
                label,
            }),
            Expr::Update { target, span } => Ok(Expr::Update {
                target: Box::new(target.optimize(ctx)?),
                span,
            }),
            leaf => Ok(leaf),
        }
    }

    /// Evaluate this expression
    pub fn value(&self, ctx: &mut QueryContext) -> QueryResult<Value> {
        match self {
            Expr::Value(value) => Ok(value.clone()),
            Expr::ContextItem { span } => ctx
                .context_value()
                .cloned()
                .ok_or(QueryError::ContextItemAbsent { span: *span }),
            Expr::VarRef(r) => {
                let slot = r.slot.ok_or_else(|| QueryError::UnassignedSlot { var: r.label() })?;
                trace!("reading {} from slot {}", r.label(), slot);
                ctx.stack()
                    .get(slot)
                    .cloned()
                    .ok_or_else(|| QueryError::UninitializedVariable {
                        var: r.label(),
                        span: r.span,
                    })
            }
            Expr::Seq(exprs) => {
                let mut result = Value::empty();
                for expr in exprs {
                    result = result.concat(expr.value(ctx)?);
                }
                Ok(result)
            }
            Expr::TypeCheck(check) => check.value(ctx),
            Expr::Trace { expr, label } => {
                let value = expr.value(ctx)?;
                ctx.trace(label, &value);
                Ok(value)
            }
            Expr::Update { target, .. } => {
                target.value(ctx)?;
                Ok(Value::empty())
            }
        }
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Value(value)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Value(value) => write!(f, "{}", value),
            Expr::ContextItem { .. } => f.write_str("."),
            Expr::VarRef(r) => f.write_str(&r.label()),
            Expr::Seq(exprs) => {
                let items: Vec<String> = exprs.iter().map(|e| e.to_string()).collect();
                write!(f, "({})", items.join(", "))
            }
            Expr::TypeCheck(check) => write!(f, "{}", check),
            Expr::Trace { expr, label } => write!(f, "trace({}, \"{}\")", expr, label),
            Expr::Update { target, .. } => write!(f, "delete node {}", target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn var(id: u32, name: &str) -> Var {
        Var::new(VarId(id), Some(QName::local(name)), None, false)
    }

    fn int(i: i64) -> Expr {
        Expr::Value(Value::integer(i))
    }

    #[test]
    fn test_count_and_uses() {
        let x = var(0, "x");
        let y = var(1, "y");
        let expr = Expr::Seq(vec![
            Expr::var_ref(&x, Span::default()),
            Expr::trace(Expr::var_ref(&x, Span::default()), "x: "),
            Expr::var_ref(&y, Span::default()),
        ]);
        assert_eq!(expr.count(x.id()), 2);
        assert_eq!(expr.count(y.id()), 1);
        assert_eq!(expr.count(VarId(9)), 0);
        assert!(expr.uses(Use::Var));
        assert!(expr.uses(Use::NonDeterministic));
        assert!(!expr.uses(Use::Update));
        assert!(!expr.uses(Use::Context));
    }

    #[rstest]
    #[case(Expr::context_item(Span::default()), false)]
    #[case(int(1), true)]
    #[case(Expr::Seq(vec![int(1), Expr::context_item(Span::default())]), false)]
    fn test_removable(#[case] expr: Expr, #[case] expected: bool) {
        assert_eq!(expr.removable(VarId(0)), expected);
    }

    #[test]
    fn test_remove_replaces_references() {
        let x = var(0, "x");
        let expr = Expr::Seq(vec![Expr::var_ref(&x, Span::new(1, 3)), int(1)]);
        assert!(expr.removable(x.id()));
        assert_eq!(
            expr.remove(x.id()),
            Expr::Seq(vec![Expr::context_item(Span::new(1, 3)), int(1)])
        );
    }

    #[test]
    fn test_inline_substitutes_only_target() {
        let x = var(0, "x");
        let y = var(1, "y");
        let expr = Expr::trace(
            Expr::Seq(vec![Expr::var_ref(&x, Span::default()), Expr::var_ref(&y, Span::default())]),
            "",
        );
        let inlined = expr.inline(x.id(), &int(5));
        assert_eq!(inlined.count(x.id()), 0);
        assert_eq!(inlined.count(y.id()), 1);
        assert_eq!(inlined.to_string(), "trace((5, $y), \"\")");
    }

    #[test]
    fn test_optimize_merges_values() {
        let mut ctx = QueryContext::new();
        let expr = Expr::Seq(vec![int(1), Expr::Seq(vec![int(2), Expr::Value(Value::empty())]), int(3)]);
        assert_eq!(
            expr.optimize(&mut ctx).unwrap(),
            Expr::Value(Value::from_items((1..=3).map(xq_types::Item::Integer)))
        );

        let single = Expr::Seq(vec![Expr::context_item(Span::default())]);
        assert_eq!(
            single.optimize(&mut ctx).unwrap(),
            Expr::context_item(Span::default())
        );
    }

    #[test]
    fn test_static_type() {
        let expr = Expr::Seq(vec![int(1), Expr::context_item(Span::default())]);
        assert_eq!(expr.static_type(), "item()+".parse::<SeqType>().unwrap());
        assert_eq!(Expr::Seq(vec![]).static_type(), SeqType::EMPTY);
        assert_eq!(Expr::update(int(1), Span::default()).static_type(), SeqType::EMPTY);
    }

    #[test]
    fn test_var_ref_evaluation() {
        let mut ctx = QueryContext::new();
        let mut x = var(0, "x");
        let unresolved = Expr::var_ref(&x, Span::default());
        assert!(matches!(
            unresolved.value(&mut ctx),
            Err(QueryError::UnassignedSlot { .. })
        ));

        x.set_slot(0);
        let resolved = Expr::var_ref(&x, Span::default());
        assert!(matches!(
            resolved.value(&mut ctx),
            Err(QueryError::UninitializedVariable { .. })
        ));

        ctx.bind(&x, Value::integer(4), Span::default()).unwrap();
        assert_eq!(resolved.value(&mut ctx).unwrap(), Value::integer(4));
    }

    #[test]
    fn test_context_item_absent() {
        let mut ctx = QueryContext::new();
        let err = Expr::context_item(Span::new(0, 1)).value(&mut ctx).unwrap_err();
        assert_eq!(err, QueryError::ContextItemAbsent { span: Span::new(0, 1) });
    }

    #[test]
    fn test_trace_records_output() {
        let mut ctx = QueryContext::new();
        let expr = Expr::trace(int(7), "seven: ");
        assert_eq!(expr.value(&mut ctx).unwrap(), Value::integer(7));
        assert_eq!(ctx.traces(), ["seven: 7".to_string()]);
    }
}
