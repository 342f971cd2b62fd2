//! Compiler options

use serde::{Deserialize, Serialize};

/// Options controlling optimization and reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Collect compile-time info diagnostics for applied optimizations
    pub comp_info: bool,
    /// Substitute variables whose bound expression is already a value
    pub inline_values: bool,
    /// Maximum number of references for which a binding is substituted
    pub inline_limit: usize,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            comp_info: true,
            inline_values: true,
            inline_limit: 1,
        }
    }
}

impl CompilerOptions {
    /// Load options from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Disable info diagnostics
    pub fn without_comp_info(mut self) -> Self {
        self.comp_info = false;
        self
    }

    pub fn with_inline_limit(mut self, limit: usize) -> Self {
        self.inline_limit = limit;
        self
    }
}
