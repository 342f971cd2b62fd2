//! Runtime type checks inserted for declared types

use serde::Serialize;
use std::fmt;
use xq_diagnostics::{Span, XQC0500};
use xq_types::{SeqType, Value};

use crate::{Expr, QueryContext, QueryError, QueryResult};

/// Check a value against `seq_type`, applying function conversion if `promote` is set
pub(crate) fn check_value(
    seq_type: &SeqType,
    promote: bool,
    value: Value,
    span: Span,
) -> QueryResult<Value> {
    if seq_type.instance(&value) {
        return Ok(value);
    }
    let found = value.seq_type();
    if promote {
        seq_type
            .promote(value)
            .map_err(|_| QueryError::incompatible_cast(*seq_type, found, span))
    } else {
        Err(QueryError::incompatible_cast(*seq_type, found, span))
    }
}

/// Expression node checking (or converting) the result of its operand
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeCheck {
    pub expr: Expr,
    pub seq_type: SeqType,
    /// Apply function conversion instead of rejecting mismatches
    pub promote: bool,
    pub span: Span,
}

impl TypeCheck {
    pub fn new(expr: Expr, seq_type: SeqType, promote: bool, span: Span) -> Self {
        Self {
            expr,
            seq_type,
            promote,
            span,
        }
    }

    /// Remove the check if the operand is statically known to pass, and
    /// pre-evaluate it on values
    pub fn optimize(self, ctx: &mut QueryContext) -> QueryResult<Expr> {
        let Self {
            expr,
            seq_type,
            promote,
            span,
        } = self;
        let expr = expr.optimize(ctx)?;

        let static_type = expr.static_type();
        if static_type.instance_of(&seq_type) {
            ctx.comp_info(XQC0500, format!("removing check of {} as {}", expr, seq_type));
            return Ok(expr);
        }
        let fits = if promote {
            static_type.convertible_to(&seq_type)
        } else {
            static_type.intersect(&seq_type).is_some()
        };
        if !fits {
            return Err(QueryError::incompatible_cast(seq_type, static_type, span));
        }

        match expr {
            Expr::Value(value) => Ok(Expr::Value(check_value(&seq_type, promote, value, span)?)),
            expr => Ok(Expr::TypeCheck(Box::new(Self::new(expr, seq_type, promote, span)))),
        }
    }

    /// Static type of the checked result
    pub fn static_type(&self) -> SeqType {
        let operand = self.expr.static_type();
        match operand.intersect(&self.seq_type) {
            Some(narrowed) if !self.promote => narrowed,
            _ => self.seq_type,
        }
    }

    pub fn value(&self, ctx: &mut QueryContext) -> QueryResult<Value> {
        let value = self.expr.value(ctx)?;
        check_value(&self.seq_type, self.promote, value, self.span)
    }
}

impl fmt::Display for TypeCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.promote { "promote to" } else { "treat as" };
        write!(f, "({} {} {})", self.expr, op, self.seq_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xq_types::Item;

    fn st(s: &str) -> SeqType {
        s.parse().unwrap()
    }

    #[test]
    fn test_redundant_check_is_removed() {
        let mut ctx = QueryContext::new();
        let check = TypeCheck::new(Expr::Value(Value::integer(1)), st("xs:decimal?"), false, Span::default());
        assert_eq!(check.optimize(&mut ctx).unwrap(), Expr::Value(Value::integer(1)));
        assert_eq!(ctx.infos().len(), 1);
    }

    #[test]
    fn test_values_are_converted_at_compile_time() {
        let mut ctx = QueryContext::new();
        let check = TypeCheck::new(Expr::Value(Value::integer(2)), st("xs:double"), true, Span::default());
        assert_eq!(
            check.optimize(&mut ctx).unwrap(),
            Expr::Value(Value::single(Item::Double(2.0)))
        );
    }

    #[test]
    fn test_static_mismatch_is_reported() {
        let mut ctx = QueryContext::new();
        let check = TypeCheck::new(Expr::Value(Value::integer(2)), SeqType::STRING, false, Span::new(1, 2));
        let err = check.optimize(&mut ctx).unwrap_err();
        assert_eq!(
            err,
            QueryError::incompatible_cast(SeqType::STRING, SeqType::INTEGER, Span::new(1, 2))
        );
    }

    #[test]
    fn test_dynamic_check_is_kept() {
        let mut ctx = QueryContext::new();
        let check = TypeCheck::new(Expr::context_item(Span::default()), SeqType::INTEGER, false, Span::default());
        let optimized = check.optimize(&mut ctx).unwrap();
        assert!(matches!(optimized, Expr::TypeCheck(_)));
        assert_eq!(optimized.static_type(), SeqType::INTEGER);

        ctx.set_context_value(Some(Value::integer(3)));
        assert_eq!(optimized.value(&mut ctx).unwrap(), Value::integer(3));

        ctx.set_context_value(Some(Value::string("x")));
        assert!(optimized.value(&mut ctx).is_err());
    }
}
