//! Item types
//!
//! Item types form a single-rooted tree under `item()`:
//! - `node()` with its kinds (element, attribute, text, document)
//! - `xs:anyAtomicType` with the atomic types; `xs:integer` derives from
//!   `xs:decimal`
//!
//! Because the hierarchy is a tree, the greatest lower bound of two item types
//! is the narrower one when they are related, and undefined otherwise.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypeError;

/// An item type of the sequence type system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    // === Top ===
    /// `item()` - supertype of all items
    Item,

    // === Nodes ===
    /// `node()`
    Node,
    /// `element()`
    Element,
    /// `attribute()`
    Attribute,
    /// `text()`
    Text,
    /// `document-node()`
    Document,

    // === Atomic Types ===
    /// `xs:anyAtomicType`
    AnyAtomic,
    /// `xs:untypedAtomic`
    Untyped,
    /// `xs:string`
    String,
    /// `xs:anyURI`
    AnyUri,
    /// `xs:boolean`
    Boolean,
    /// `xs:decimal`
    Decimal,
    /// `xs:integer`
    Integer,
    /// `xs:double`
    Double,
    /// `xs:float`
    Float,
    /// `xs:date`
    Date,
    /// `xs:dateTime`
    DateTime,
}

impl ItemType {
    /// All item types, parents before children
    pub const ALL: [ItemType; 17] = [
        Self::Item,
        Self::Node,
        Self::Element,
        Self::Attribute,
        Self::Text,
        Self::Document,
        Self::AnyAtomic,
        Self::Untyped,
        Self::String,
        Self::AnyUri,
        Self::Boolean,
        Self::Decimal,
        Self::Integer,
        Self::Double,
        Self::Float,
        Self::Date,
        Self::DateTime,
    ];

    /// Direct supertype, `None` for `item()`
    pub const fn parent(&self) -> Option<ItemType> {
        match self {
            Self::Item => None,
            Self::Node | Self::AnyAtomic => Some(Self::Item),
            Self::Element | Self::Attribute | Self::Text | Self::Document => Some(Self::Node),
            Self::Integer => Some(Self::Decimal),
            Self::Untyped
            | Self::String
            | Self::AnyUri
            | Self::Boolean
            | Self::Decimal
            | Self::Double
            | Self::Float
            | Self::Date
            | Self::DateTime => Some(Self::AnyAtomic),
        }
    }

    /// Lexical name as used in sequence type syntax
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Item => "item()",
            Self::Node => "node()",
            Self::Element => "element()",
            Self::Attribute => "attribute()",
            Self::Text => "text()",
            Self::Document => "document-node()",
            Self::AnyAtomic => "xs:anyAtomicType",
            Self::Untyped => "xs:untypedAtomic",
            Self::String => "xs:string",
            Self::AnyUri => "xs:anyURI",
            Self::Boolean => "xs:boolean",
            Self::Decimal => "xs:decimal",
            Self::Integer => "xs:integer",
            Self::Double => "xs:double",
            Self::Float => "xs:float",
            Self::Date => "xs:date",
            Self::DateTime => "xs:dateTime",
        }
    }

    pub fn is_node(&self) -> bool {
        self.instance_of(Self::Node)
    }

    pub fn is_atomic(&self) -> bool {
        self.instance_of(Self::AnyAtomic)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Decimal | Self::Integer | Self::Double | Self::Float
        )
    }

    /// Check if every item of this type is an item of `other`
    pub fn instance_of(&self, other: ItemType) -> bool {
        let mut current = Some(*self);
        while let Some(ty) = current {
            if ty == other {
                return true;
            }
            current = ty.parent();
        }
        false
    }

    /// Greatest lower bound, `None` if no item can have both types
    pub fn intersect(&self, other: ItemType) -> Option<ItemType> {
        if self.instance_of(other) {
            Some(*self)
        } else if other.instance_of(*self) {
            Some(other)
        } else {
            None
        }
    }

    /// Least upper bound in the hierarchy
    pub fn union(&self, other: ItemType) -> ItemType {
        let mut current = *self;
        loop {
            if other.instance_of(current) {
                return current;
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => return Self::Item,
            }
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ItemType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|ty| ty.name() == s)
            .copied()
            .ok_or_else(|| TypeError::UnknownType(s.to_string()))
    }
}
