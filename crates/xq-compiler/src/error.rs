//! Compilation and evaluation errors

use thiserror::Error;
use xq_diagnostics::{
    Diagnostic, ErrorCode, Span, XQC0001, XQC0003, XQC0100, XQC0101, XQC0200, XQC0400, XQC0401,
};
use xq_types::SeqType;

/// Result type for compiler operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while typing, rewriting or evaluating variables
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// A value or static type cannot satisfy a declared type
    #[error("Cannot treat {found} as {expected}")]
    IncompatibleCast {
        expected: SeqType,
        found: SeqType,
        span: Span,
    },

    /// The expression bound to a variable performs updates
    #[error("Updating expression not allowed in binding of {var}")]
    UpdateInBinding { var: String, span: Span },

    /// A lazy variable was read with neither a value nor an expression
    #[error("Variable {var} has no value")]
    UninitializedVariable { var: String, span: Span },

    /// Two declared types are incomparable and cannot be merged
    #[error("Cannot merge {candidate} into declared type {declared}")]
    IncomparableTypeMerge {
        declared: SeqType,
        candidate: SeqType,
    },

    /// The context item was read while no context value is set
    #[error("Context item is undefined")]
    ContextItemAbsent { span: Span },

    /// A variable reference was evaluated before slots were assigned
    #[error("Variable {var} has no stack slot")]
    UnassignedSlot { var: String },

    /// Broken compiler invariant
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl QueryError {
    pub fn incompatible_cast(expected: SeqType, found: SeqType, span: Span) -> Self {
        Self::IncompatibleCast {
            expected,
            found,
            span,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Diagnostic code of this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::IncompatibleCast { .. } => XQC0001,
            Self::IncomparableTypeMerge { .. } => XQC0003,
            Self::UpdateInBinding { .. } => XQC0100,
            Self::UninitializedVariable { .. } => XQC0101,
            Self::ContextItemAbsent { .. } => XQC0200,
            Self::UnassignedSlot { .. } => XQC0401,
            Self::Internal { .. } => XQC0400,
        }
    }

    /// Source position of the offending construct, if known
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::IncompatibleCast { span, .. }
            | Self::UpdateInBinding { span, .. }
            | Self::UninitializedVariable { span, .. }
            | Self::ContextItemAbsent { span } => Some(*span),
            Self::IncomparableTypeMerge { .. } | Self::UnassignedSlot { .. } | Self::Internal { .. } => {
                None
            }
        }
    }

    /// Whether compilation must stop
    ///
    /// A rejected type merge only tells the caller to keep its own check.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::IncomparableTypeMerge { .. })
    }

    /// Convert into a diagnostic, resolving line and column against `source`
    pub fn to_diagnostic(&self, source: Option<&str>) -> Diagnostic {
        let diagnostic = if self.is_fatal() {
            Diagnostic::error(self.code(), self.to_string())
        } else {
            Diagnostic::warning(self.code(), self.to_string())
        };
        match (self.span(), source) {
            (Some(span), Some(source)) => diagnostic.with_span(span).locate(source),
            (Some(span), None) => diagnostic.with_span(span),
            (None, _) => diagnostic,
        }
    }
}
