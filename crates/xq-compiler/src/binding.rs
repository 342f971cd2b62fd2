//! Pre-resolution variable bindings
//!
//! A [`BindingVar`] owns the expression bound to a variable and evaluates it
//! lazily, at most once. It is used by the early compilation passes, before
//! [`VarScope::resolve`](crate::VarScope::resolve) turns it into a typed [`Var`](crate::Var).

use log::trace;
use std::fmt;
use xq_diagnostics::Span;
use xq_types::{QName, SeqType, Value};

use crate::{Expr, QueryContext, QueryError, QueryResult, Use, VarId, VarPlan};

/// A named variable with a lazily evaluated binding
///
/// Cloning duplicates the binding and its cached value but keeps the
/// identity, so references resolve to the same variable after a subtree copy.
#[derive(Debug, Clone)]
pub struct BindingVar {
    id: VarId,
    name: QName,
    declared: Option<SeqType>,
    expr: Option<Expr>,
    value: Option<Value>,
    global: bool,
    explicit: bool,
    pub span: Span,
}

impl BindingVar {
    /// Create an unbound variable
    pub fn new(ctx: &mut QueryContext, name: QName, declared: Option<SeqType>, span: Span) -> Self {
        Self {
            id: ctx.next_var_id(),
            name,
            declared,
            expr: None,
            value: None,
            global: false,
            explicit: false,
            span,
        }
    }

    /// Mark the variable as declared in the query prolog
    pub fn global(mut self) -> Self {
        self.global = true;
        self
    }

    /// Mark the variable as written by the user rather than introduced by the compiler
    pub fn explicit(mut self) -> Self {
        self.explicit = true;
        self
    }

    /// Whether the variable was declared in the query prolog
    pub fn is_global(&self) -> bool {
        self.global
    }

    /// Whether the variable was written by the user
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    /// Identity shared by all clones of this binding
    pub fn id(&self) -> VarId {
        self.id
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    /// Declared type, if any
    pub fn declared(&self) -> Option<SeqType> {
        self.declared
    }

    /// Bound expression, if any
    pub fn expr(&self) -> Option<&Expr> {
        self.expr.as_ref()
    }

    /// Memoized value, if already computed
    pub fn cached(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Static type of the variable
    pub fn seq_type(&self) -> SeqType {
        match (&self.declared, &self.value, &self.expr) {
            (Some(declared), _, _) => *declared,
            (None, Some(value), _) => value.seq_type(),
            (None, None, Some(expr)) => expr.static_type(),
            (None, None, None) => SeqType::ITEM_ZM,
        }
    }

    /// Reject updating expressions in the binding
    pub fn check(&self) -> QueryResult<()> {
        match &self.expr {
            Some(expr) if expr.uses(Use::Update) => Err(QueryError::UpdateInBinding {
                var: self.label(),
                span: self.span,
            }),
            _ => Ok(()),
        }
    }

    /// Compile the bound expression and bind the result
    ///
    /// On failure the previous binding is left in place.
    pub fn compile(&mut self, ctx: &mut QueryContext) -> QueryResult<()> {
        self.check()?;
        if let Some(expr) = &self.expr {
            let compiled = expr.clone().compile(ctx)?;
            self.bind_expr(compiled, ctx)?;
        }
        Ok(())
    }

    /// Attach an expression; values are cast and cached right away
    ///
    /// An already cached value is kept, so a binding is evaluated at most once.
    pub fn bind_expr(&mut self, expr: Expr, _ctx: &mut QueryContext) -> QueryResult<()> {
        match expr {
            Expr::Value(value) => self.bind_value(value),
            expr => {
                self.expr = Some(expr);
                Ok(())
            }
        }
    }

    /// Cast a value to the declared type and cache it
    pub fn bind_value(&mut self, value: Value) -> QueryResult<()> {
        let value = self.cast(value)?;
        self.expr = Some(Expr::Value(value.clone()));
        self.value = Some(value);
        Ok(())
    }

    /// Value of the variable, evaluating the bound expression on first access
    ///
    /// The expression is evaluated without a context value.
    pub fn value(&mut self, ctx: &mut QueryContext) -> QueryResult<Value> {
        if let Some(value) = &self.value {
            return Ok(value.clone());
        }
        let expr = self
            .expr
            .clone()
            .ok_or_else(|| QueryError::UninitializedVariable {
                var: self.label(),
                span: self.span,
            })?;

        trace!("evaluating {}", self);
        let value = ctx.with_isolated_context(|ctx| expr.compile(ctx)?.value(ctx))?;
        let value = self.cast(value)?;
        self.value = Some(value.clone());
        Ok(value)
    }

    fn cast(&self, value: Value) -> QueryResult<Value> {
        match &self.declared {
            Some(declared) => {
                let found = value.seq_type();
                declared
                    .promote(value)
                    .map_err(|_| QueryError::incompatible_cast(*declared, found, self.span))
            }
            None => Ok(value),
        }
    }

    /// Same instance or same name
    ///
    /// Only meaningful before identities are resolved: two distinct variables
    /// may share a name.
    pub fn named_like(&self, other: &BindingVar) -> bool {
        std::ptr::eq(self, other) || self.name == other.name
    }

    /// Whether both bindings denote the same variable
    pub fn is(&self, other: &BindingVar) -> bool {
        self.id == other.id
    }

    /// Query plan entry, with the bound expression nested
    pub fn plan(&self) -> VarPlan<'_> {
        VarPlan {
            name: self.label(),
            id: self.id,
            declared: self.declared.map(|t| t.to_string()),
            global: self.global,
            explicit: self.explicit,
            expr: self.expr.as_ref(),
        }
    }

    /// A binding only uses itself as a variable
    pub fn uses(&self, u: Use) -> bool {
        u == Use::Var
    }

    /// 1 if `var` is this variable, 0 otherwise
    pub fn count(&self, var: VarId) -> usize {
        usize::from(self.id == var)
    }

    /// A binding itself is never replaced; only its references are
    pub fn removable(&self, _var: VarId) -> bool {
        false
    }

    /// Returns the binding unchanged
    pub fn remove(self, _var: VarId) -> Self {
        self
    }

    fn label(&self) -> String {
        format!("${}", self.name)
    }
}

impl fmt::Display for BindingVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())?;
        if let Some(declared) = &self.declared {
            write!(f, " as {}", declared)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeCheck;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use xq_types::Item;

    fn binding(ctx: &mut QueryContext, name: &str, declared: Option<&str>) -> BindingVar {
        BindingVar::new(ctx, QName::local(name), declared.map(|d| d.parse().unwrap()), Span::default())
    }

    #[test]
    fn test_bind_value_casts() {
        let mut ctx = QueryContext::new();
        let mut x = binding(&mut ctx, "x", Some("xs:double"));
        x.bind_value(Value::integer(3)).unwrap();
        assert_eq!(x.cached(), Some(&Value::single(Item::Double(3.0))));
    }

    #[test]
    fn test_bind_value_rejects_mismatch() {
        let mut ctx = QueryContext::new();
        let mut x = binding(&mut ctx, "x", Some("xs:string"));
        let err = x.bind_value(Value::integer(5)).unwrap_err();
        assert_eq!(
            err,
            QueryError::incompatible_cast(SeqType::STRING, SeqType::INTEGER, Span::default())
        );
        assert!(x.cached().is_none());
    }

    #[test]
    fn test_bind_expr_memoizes_values_eagerly() {
        let mut ctx = QueryContext::new();
        let mut x = binding(&mut ctx, "x", None);
        x.bind_expr(Expr::value_of(Value::integer(1)), &mut ctx).unwrap();
        assert_eq!(x.cached(), Some(&Value::integer(1)));

        x.bind_expr(Expr::context_item(Span::default()), &mut ctx).unwrap();
        assert_eq!(x.cached(), Some(&Value::integer(1)));
        assert_eq!(x.expr(), Some(&Expr::context_item(Span::default())));
    }

    #[test]
    fn test_value_is_evaluated_once() {
        let mut ctx = QueryContext::new();
        let mut x = binding(&mut ctx, "x", None);
        x.bind_expr(Expr::trace(Expr::value_of(Value::integer(2)), "x"), &mut ctx)
            .unwrap();

        let first = x.value(&mut ctx).unwrap();
        let second = x.value(&mut ctx).unwrap();
        assert_eq!(first, second);
        assert_eq!(ctx.traces().len(), 1);
    }

    #[test]
    fn test_value_hides_context() {
        let mut ctx = QueryContext::new();
        ctx.set_context_value(Some(Value::integer(1)));
        let mut x = binding(&mut ctx, "x", None);
        x.bind_expr(Expr::context_item(Span::default()), &mut ctx).unwrap();

        assert!(matches!(
            x.value(&mut ctx),
            Err(QueryError::ContextItemAbsent { .. })
        ));
        assert_eq!(ctx.context_value(), Some(&Value::integer(1)));
    }

    #[test]
    fn test_value_restores_context_after_success() {
        let mut ctx = QueryContext::new();
        ctx.set_context_value(Some(Value::string("outer")));
        let mut x = binding(&mut ctx, "x", Some("xs:double"));
        x.bind_expr(Expr::trace(Expr::value_of(Value::integer(4)), ""), &mut ctx)
            .unwrap();

        assert_eq!(x.value(&mut ctx).unwrap(), Value::single(Item::Double(4.0)));
        assert_eq!(ctx.context_value(), Some(&Value::string("outer")));
    }

    #[test]
    fn test_compile_after_value_keeps_cache() {
        let mut ctx = QueryContext::new();
        let mut x = binding(&mut ctx, "x", None);
        x.bind_expr(Expr::trace(Expr::value_of(Value::integer(1)), "x: "), &mut ctx)
            .unwrap();

        let first = x.value(&mut ctx).unwrap();
        x.compile(&mut ctx).unwrap();
        let second = x.value(&mut ctx).unwrap();
        assert_eq!(first, second);
        assert_eq!(ctx.traces(), ["x: 1".to_string()]);
    }

    #[test]
    fn test_failed_compile_keeps_binding() {
        let mut ctx = QueryContext::new();
        let mut x = binding(&mut ctx, "x", None);
        let bound = Expr::TypeCheck(Box::new(TypeCheck::new(
            Expr::value_of(Value::integer(1)),
            SeqType::STRING,
            false,
            Span::new(8, 9),
        )));
        x.bind_expr(bound.clone(), &mut ctx).unwrap();

        let err = x.compile(&mut ctx).unwrap_err();
        assert!(matches!(err, QueryError::IncompatibleCast { .. }));
        assert_eq!(x.expr(), Some(&bound));
        assert!(matches!(
            x.value(&mut ctx),
            Err(QueryError::IncompatibleCast { .. })
        ));
    }

    #[test]
    fn test_uninitialized() {
        let mut ctx = QueryContext::new();
        let mut x = binding(&mut ctx, "x", None);
        let err = x.value(&mut ctx).unwrap_err();
        assert!(matches!(err, QueryError::UninitializedVariable { .. }));
    }

    #[test]
    fn test_check_rejects_updates() {
        let mut ctx = QueryContext::new();
        let mut x = binding(&mut ctx, "x", None);
        x.bind_expr(Expr::update(Expr::context_item(Span::default()), Span::default()), &mut ctx)
            .unwrap();
        assert!(matches!(x.check(), Err(QueryError::UpdateInBinding { .. })));
        assert!(x.compile(&mut ctx).is_err());
    }

    #[test]
    fn test_compile_binds_values() {
        let mut ctx = QueryContext::new();
        let mut x = binding(&mut ctx, "x", Some("xs:integer+"));
        x.bind_expr(
            Expr::Seq(vec![Expr::value_of(Value::integer(1)), Expr::value_of(Value::integer(2))]),
            &mut ctx,
        )
        .unwrap();
        assert!(x.cached().is_none());

        x.compile(&mut ctx).unwrap();
        assert_eq!(x.cached().map(Value::len), Some(2));
    }

    #[test]
    fn test_clone_keeps_identity() {
        let mut ctx = QueryContext::new();
        let x = binding(&mut ctx, "x", None);
        let y = binding(&mut ctx, "x", None);
        let copy = x.clone();

        assert!(copy.is(&x));
        assert!(!y.is(&x));
        assert!(y.named_like(&x));
        assert!(x.named_like(&x));
        assert_eq!(copy.count(x.id()), 1);
        assert_eq!(copy.count(y.id()), 0);
        assert!(!x.removable(x.id()));
        assert!(x.uses(Use::Var));
        assert!(!x.uses(Use::Update));
    }

    #[test]
    fn test_display() {
        let mut ctx = QueryContext::new();
        assert_eq!(binding(&mut ctx, "x", Some("xs:string?")).to_string(), "$x as xs:string?");
        assert_eq!(binding(&mut ctx, "y", None).to_string(), "$y");
    }

    #[test]
    fn test_global_and_explicit_are_independent() {
        let mut ctx = QueryContext::new();
        let g = binding(&mut ctx, "g", None).global();
        assert!(g.is_global());
        assert!(!g.is_explicit());

        let e = binding(&mut ctx, "e", None).explicit();
        assert!(!e.is_global());
        assert!(e.is_explicit());
        assert!(e.clone().is_explicit());
    }

    #[test]
    fn test_plan() {
        let mut ctx = QueryContext::new();
        let mut x = binding(&mut ctx, "x", Some("xs:integer*")).global();
        assert_eq!(
            serde_json::to_value(x.plan()).unwrap(),
            json!({ "name": "$x", "id": x.id(), "as": "xs:integer*", "global": true })
        );

        let bound = Expr::context_item(Span::new(2, 3));
        x.bind_expr(bound.clone(), &mut ctx).unwrap();
        let plan = serde_json::to_value(x.plan()).unwrap();
        assert_eq!(plan["expr"], serde_json::to_value(&bound).unwrap());
    }
}
