//! Namespace-aware qualified names

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A qualified name (`prefix:local` bound to a namespace URI)
///
/// Two names are equal when namespace URI and local part match; the prefix is
/// only kept for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QName {
    /// Namespace prefix as written in the query
    pub prefix: Option<String>,
    /// Namespace URI, `None` for the empty namespace
    pub uri: Option<String>,
    /// Local part
    pub local: String,
}

impl QName {
    /// Create a name in no namespace
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            uri: None,
            local: local.into(),
        }
    }

    /// Create a prefixed name bound to a namespace URI
    pub fn prefixed(
        prefix: impl Into<String>,
        uri: impl Into<String>,
        local: impl Into<String>,
    ) -> Self {
        Self {
            prefix: Some(prefix.into()),
            uri: Some(uri.into()),
            local: local.into(),
        }
    }

    /// Create a name bound to a namespace URI without a prefix
    pub fn in_namespace(uri: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            uri: Some(uri.into()),
            local: local.into(),
        }
    }

    /// Expanded notation `Q{uri}local`
    pub fn expanded(&self) -> String {
        match &self.uri {
            Some(uri) => format!("Q{{{}}}{}", uri, self.local),
            None => self.local.clone(),
        }
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri && self.local == other.local
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
        self.local.hash(state);
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.prefix, &self.uri) {
            (Some(prefix), _) => write!(f, "{}:{}", prefix, self.local),
            (None, Some(_)) => write!(f, "{}", self.expanded()),
            (None, None) => write!(f, "{}", self.local),
        }
    }
}

impl From<&str> for QName {
    fn from(s: &str) -> Self {
        Self::local(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_ignores_prefix() {
        let a = QName::prefixed("a", "urn:x", "v");
        let b = QName::prefixed("b", "urn:x", "v");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_namespace_distinguishes() {
        assert_ne!(QName::local("v"), QName::in_namespace("urn:x", "v"));
    }

    #[test]
    fn test_display() {
        assert_eq!(QName::local("x").to_string(), "x");
        assert_eq!(QName::prefixed("local", "urn:l", "x").to_string(), "local:x");
        assert_eq!(QName::in_namespace("urn:l", "x").to_string(), "Q{urn:l}x");
    }
}
