//! Structured error codes for the query compiler
//!
//! Error code ranges:
//! - XQC0001-XQC0099: Type errors (casts, conversions, type merges)
//! - XQC0100-XQC0199: Static errors (declaration checks)
//! - XQC0200-XQC0299: Dynamic errors (evaluation)
//! - XQC0300-XQC0399: Full-text errors
//! - XQC0400-XQC0499: Internal errors (compiler defects)
//! - XQC0500-XQC0599: Compiler information (optimizations)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Static description of this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    pub const fn is_type_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    pub const fn is_static_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    pub const fn is_dynamic_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    pub const fn is_full_text_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    pub const fn is_internal_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    pub const fn is_info(&self) -> bool {
        self.0 >= 500 && self.0 < 600
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XQC{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Type errors
    map.insert(
        1,
        ErrorInfo::new("Incompatible cast")
            .with_help("The value cannot be promoted to the declared type of the variable"),
    );
    map.insert(2, ErrorInfo::new("Cardinality mismatch"));
    map.insert(
        3,
        ErrorInfo::new("Incomparable type merge")
            .with_help("Neither type is an instance of the other; an explicit check is required"),
    );

    // Static errors
    map.insert(100, ErrorInfo::new("Updating expression in variable binding"));
    map.insert(101, ErrorInfo::new("Uninitialized variable"));

    // Dynamic errors
    map.insert(200, ErrorInfo::new("Context item is undefined"));

    // Full-text errors
    map.insert(300, ErrorInfo::new("Unsupported stemming language"));

    // Internal errors
    map.insert(400, ErrorInfo::new("Internal error"));
    map.insert(401, ErrorInfo::new("Variable has no stack slot"));

    // Compiler information
    map.insert(500, ErrorInfo::new("Redundant type check removed"));
    map.insert(501, ErrorInfo::new("Variable inlined"));
    map.insert(502, ErrorInfo::new("Unused variable removed"));

    map
});

// Type errors
pub const XQC0001: ErrorCode = ErrorCode::new(1);
pub const XQC0002: ErrorCode = ErrorCode::new(2);
pub const XQC0003: ErrorCode = ErrorCode::new(3);

// Static errors
pub const XQC0100: ErrorCode = ErrorCode::new(100);
pub const XQC0101: ErrorCode = ErrorCode::new(101);

// Dynamic errors
pub const XQC0200: ErrorCode = ErrorCode::new(200);

// Full-text errors
pub const XQC0300: ErrorCode = ErrorCode::new(300);

// Internal errors
pub const XQC0400: ErrorCode = ErrorCode::new(400);
pub const XQC0401: ErrorCode = ErrorCode::new(401);

// Compiler information
pub const XQC0500: ErrorCode = ErrorCode::new(500);
pub const XQC0501: ErrorCode = ErrorCode::new(501);
pub const XQC0502: ErrorCode = ErrorCode::new(502);
