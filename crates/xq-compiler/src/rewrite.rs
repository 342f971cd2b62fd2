//! Variable rewrites built on the uniform rewrite surface
//!
//! These passes only use the hooks of [`Expr`] and the refinement operations
//! of [`Var`](crate::Var); they never inspect expression internals beyond
//! that.

use log::debug;
use xq_diagnostics::{Span, XQC0501, XQC0502};

use crate::{Expr, QueryContext, QueryError, QueryResult, TypeCheck, Use, VarId, VarScope};

/// Outcome of [`inline_let`]
#[derive(Debug, Clone, PartialEq)]
pub enum LetRewrite {
    /// The binding was unused and has been dropped
    Eliminated(Expr),
    /// All references were replaced by the (checked) bound expression
    Inlined(Expr),
    /// The binding is kept; `bound` carries the runtime check if one is needed
    Kept { bound: Expr, body: Expr },
}

/// Let the variable take over a type check wrapped around its bound expression
///
/// If the check cannot be merged into the declared type, the expression is
/// returned unchanged and keeps its own check.
pub fn absorb_type_check(scope: &mut VarScope, var: VarId, bound: Expr) -> QueryResult<Expr> {
    let check = match bound {
        Expr::TypeCheck(check) => check,
        other => return Ok(other),
    };
    match scope.var_mut(var)?.adopt_check(check.seq_type, check.promote) {
        Ok(()) => Ok(check.expr),
        Err(QueryError::IncomparableTypeMerge { declared, candidate }) => {
            debug!("keeping check {} next to declared type {}", candidate, declared);
            Ok(Expr::TypeCheck(check))
        }
        Err(err) => Err(err),
    }
}

/// Optimize `let $var := bound return body`
///
/// The static type of `bound` is folded into the variable first. Unused
/// bindings without side effects are dropped; bindings to values or with few
/// references are substituted.
pub fn inline_let(
    ctx: &mut QueryContext,
    scope: &mut VarScope,
    var: VarId,
    bound: Expr,
    body: Expr,
    span: Span,
) -> QueryResult<LetRewrite> {
    let bound = absorb_type_check(scope, var, bound)?;
    let observed = bound.static_type();
    scope.var_mut(var)?.refine_type(Some(&observed), ctx, span)?;
    let body = body.resolve_slots(scope);

    let label = scope.var(var)?.label();
    let count = body.count(var);
    let pure = !bound.uses(Use::NonDeterministic) && !bound.uses(Use::Update);

    if count == 0 && pure {
        ctx.comp_info(XQC0502, format!("removing unused variable {}", label));
        scope.remove(var);
        return Ok(LetRewrite::Eliminated(body));
    }

    let options = ctx.options();
    let movable = pure && !bound.uses(Use::Context);
    let inline = (bound.is_value() && options.inline_values)
        || (movable && count <= options.inline_limit);

    let checked = scope.var(var)?.checked(bound, ctx, span)?;
    if !inline {
        return Ok(LetRewrite::Kept {
            bound: checked,
            body,
        });
    }

    ctx.comp_info(XQC0501, format!("inlining {}", label));
    scope.remove(var);
    Ok(LetRewrite::Inlined(body.inline(var, &checked)))
}

/// Bind an argument to a parameter of an inlined function
///
/// The argument's static type is merged into a declared parameter type with
/// `adopt_check` and the argument gets the check the parameter still needs.
/// Unconstrained parameters are only refined.
/// If the types are incomparable, the argument is wrapped in an explicit check
/// of the declared parameter type instead.
pub fn inline_argument(
    ctx: &mut QueryContext,
    scope: &mut VarScope,
    param: VarId,
    arg: Expr,
    span: Span,
) -> QueryResult<Expr> {
    let arg_type = arg.static_type();
    let var = scope.var_mut(param)?;
    if var.declared().is_some() {
        match var.adopt_check(arg_type, false) {
            Ok(()) => {}
            Err(QueryError::IncomparableTypeMerge { declared, .. }) => {
                let promote = var.promotes();
                return TypeCheck::new(arg, declared, promote, span).optimize(ctx);
            }
            Err(err) => return Err(err),
        }
    }
    var.refine_type(Some(&arg_type), ctx, span)?;
    scope.var(param)?.checked(arg, ctx, span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompilerOptions;
    use pretty_assertions::assert_eq;
    use xq_types::{QName, SeqType, Value};

    fn setup(declared: Option<SeqType>) -> (QueryContext, VarScope, VarId) {
        let mut ctx = QueryContext::new();
        let mut scope = VarScope::new();
        let x = scope.new_local(&mut ctx, Some(QName::local("x")), declared);
        (ctx, scope, x)
    }

    fn x_ref(scope: &VarScope, x: VarId) -> Expr {
        Expr::var_ref(scope.var(x).unwrap(), Span::default())
    }

    #[test]
    fn test_unused_binding_is_eliminated() {
        let (mut ctx, mut scope, x) = setup(None);
        let body = Expr::value_of(Value::integer(1));
        let result = inline_let(
            &mut ctx,
            &mut scope,
            x,
            Expr::context_item(Span::default()),
            body.clone(),
            Span::default(),
        )
        .unwrap();
        assert_eq!(result, LetRewrite::Eliminated(body));
        assert!(scope.get(x).is_none());
    }

    #[test]
    fn test_unused_trace_is_kept() {
        let (mut ctx, mut scope, x) = setup(None);
        let bound = Expr::trace(Expr::context_item(Span::default()), "");
        let result = inline_let(
            &mut ctx,
            &mut scope,
            x,
            bound.clone(),
            Expr::value_of(Value::empty()),
            Span::default(),
        )
        .unwrap();
        assert!(matches!(result, LetRewrite::Kept { .. }));
    }

    #[test]
    fn test_value_binding_is_inlined_without_check() {
        let (mut ctx, mut scope, x) = setup(Some(SeqType::INTEGER_ZM));
        let body = Expr::Seq(vec![x_ref(&scope, x), x_ref(&scope, x)]);
        let result = inline_let(
            &mut ctx,
            &mut scope,
            x,
            Expr::value_of(Value::integer(3)),
            body,
            Span::default(),
        )
        .unwrap();
        assert_eq!(
            result,
            LetRewrite::Inlined(Expr::Seq(vec![
                Expr::value_of(Value::integer(3)),
                Expr::value_of(Value::integer(3)),
            ]))
        );
    }

    #[test]
    fn test_repeated_reference_keeps_checked_binding() {
        let (mut ctx, mut scope, x) = setup(Some(SeqType::INTEGER));
        let body = Expr::Seq(vec![x_ref(&scope, x), x_ref(&scope, x)]);
        let result = inline_let(
            &mut ctx,
            &mut scope,
            x,
            Expr::context_item(Span::default()),
            body,
            Span::default(),
        )
        .unwrap();
        match result {
            LetRewrite::Kept { bound, body } => {
                assert!(matches!(bound, Expr::TypeCheck(_)));
                assert_eq!(body.static_type(), "xs:integer+".parse::<SeqType>().unwrap());
            }
            other => panic!("expected kept binding, got {:?}", other),
        }
    }

    #[test]
    fn test_inline_limit_option() {
        let mut ctx = QueryContext::with_options(CompilerOptions::default().with_inline_limit(2));
        let mut scope = VarScope::new();
        let x = scope.new_local(&mut ctx, Some(QName::local("x")), None);
        let bound = Expr::Seq(vec![
            Expr::value_of(Value::integer(1)),
            Expr::update(Expr::value_of(Value::empty()), Span::default()),
        ]);
        let body = Expr::Seq(vec![x_ref(&scope, x), x_ref(&scope, x)]);
        let kept = inline_let(&mut ctx, &mut scope, x, bound, body.clone(), Span::default()).unwrap();
        assert!(matches!(kept, LetRewrite::Kept { .. }));

        let y = scope.new_local(&mut ctx, Some(QName::local("y")), None);
        let body = Expr::Seq(vec![x_ref(&scope, y), x_ref(&scope, y)]);
        let bound = Expr::Seq(vec![Expr::value_of(Value::integer(1)), Expr::Seq(vec![])]);
        let inlined = inline_let(&mut ctx, &mut scope, y, bound, body, Span::default()).unwrap();
        assert!(matches!(inlined, LetRewrite::Inlined(_)));
    }

    #[test]
    fn test_absorb_type_check() {
        let (_, mut scope, x) = setup(Some(SeqType::INTEGER_ZM));
        let inner = Expr::context_item(Span::default());
        let bound = Expr::TypeCheck(Box::new(TypeCheck::new(
            inner.clone(),
            SeqType::INTEGER,
            false,
            Span::default(),
        )));
        assert_eq!(absorb_type_check(&mut scope, x, bound).unwrap(), inner);
        assert_eq!(scope.var(x).unwrap().declared(), Some(SeqType::INTEGER));

        let string_check = Expr::TypeCheck(Box::new(TypeCheck::new(
            inner,
            SeqType::STRING,
            false,
            Span::default(),
        )));
        let kept = absorb_type_check(&mut scope, x, string_check.clone()).unwrap();
        assert_eq!(kept, string_check);
        assert_eq!(scope.var(x).unwrap().declared(), Some(SeqType::INTEGER));
    }

    #[test]
    fn test_inline_argument() {
        let mut ctx = QueryContext::new();
        let mut scope = VarScope::new();
        let p = scope.new_param(&mut ctx, QName::local("p"), Some("xs:decimal*".parse().unwrap()));

        let arg = inline_argument(&mut ctx, &mut scope, p, Expr::value_of(Value::integer(1)), Span::default())
            .unwrap();
        assert_eq!(arg, Expr::value_of(Value::integer(1)));
        let param = scope.var(p).unwrap();
        assert_eq!(param.seq_type(), SeqType::INTEGER);
        assert!(!param.checks_type());

        let q = scope.new_param(&mut ctx, QName::local("q"), Some(SeqType::STRING));
        let arg = inline_argument(
            &mut ctx,
            &mut scope,
            q,
            Expr::context_item(Span::default()),
            Span::default(),
        )
        .unwrap();
        assert!(matches!(arg, Expr::TypeCheck(_)));
    }

    #[test]
    fn test_inline_argument_into_unconstrained_param() {
        let mut ctx = QueryContext::new();
        let mut scope = VarScope::new();
        let p = scope.new_param(&mut ctx, QName::local("p"), None);
        let free = scope.new_local(&mut ctx, Some(QName::local("free")), None);

        let arg = x_ref(&scope, free);
        assert_eq!(arg.static_type(), SeqType::ITEM_ZM);
        let inlined = inline_argument(&mut ctx, &mut scope, p, arg.clone(), Span::default()).unwrap();
        assert_eq!(inlined, arg);
        let param = scope.var(p).unwrap();
        assert_eq!(param.declared(), None);
        assert!(!param.checks_type());
    }
}
