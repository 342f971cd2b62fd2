//! Sequence types
//!
//! A sequence type pairs an item type with an occurrence indicator. Sequence
//! types form a lattice under [`SeqType::instance_of`]; [`SeqType::intersect`]
//! computes the greatest lower bound where one exists.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ItemType, Occurrence, TypeError, TypeResult, Value};

/// A sequence type (`xs:integer*`, `element()?`, `empty-sequence()`, ...)
///
/// Types with the [`Occurrence::Zero`] indicator are normalized to
/// `empty-sequence()`, so structural equality is type equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeqType {
    pub item: ItemType,
    pub occ: Occurrence,
}

impl SeqType {
    /// `item()*`, the universal sequence type
    pub const ITEM_ZM: SeqType = SeqType::new(ItemType::Item, Occurrence::ZeroOrMore);
    /// `item()`
    pub const ITEM: SeqType = SeqType::new(ItemType::Item, Occurrence::One);
    /// `empty-sequence()`
    pub const EMPTY: SeqType = SeqType::new(ItemType::Item, Occurrence::Zero);
    /// `xs:integer`
    pub const INTEGER: SeqType = SeqType::new(ItemType::Integer, Occurrence::One);
    /// `xs:integer*`
    pub const INTEGER_ZM: SeqType = SeqType::new(ItemType::Integer, Occurrence::ZeroOrMore);
    /// `xs:string`
    pub const STRING: SeqType = SeqType::new(ItemType::String, Occurrence::One);
    /// `xs:boolean`
    pub const BOOLEAN: SeqType = SeqType::new(ItemType::Boolean, Occurrence::One);

    pub const fn new(item: ItemType, occ: Occurrence) -> Self {
        let item = match occ {
            Occurrence::Zero => ItemType::Item,
            _ => item,
        };
        Self { item, occ }
    }

    pub const fn one(item: ItemType) -> Self {
        Self::new(item, Occurrence::One)
    }

    pub const fn zero_or_one(item: ItemType) -> Self {
        Self::new(item, Occurrence::ZeroOrOne)
    }

    pub const fn zero_or_more(item: ItemType) -> Self {
        Self::new(item, Occurrence::ZeroOrMore)
    }

    pub const fn one_or_more(item: ItemType) -> Self {
        Self::new(item, Occurrence::OneOrMore)
    }

    /// Same item type with another occurrence indicator
    pub const fn with_occ(&self, occ: Occurrence) -> Self {
        Self::new(self.item, occ)
    }

    pub fn is_empty_sequence(&self) -> bool {
        self.occ == Occurrence::Zero
    }

    /// Exact number of items, if the type fixes it
    pub fn size(&self) -> Option<usize> {
        match (self.occ.min(), self.occ.max()) {
            (min, Some(max)) if min == max => Some(min),
            _ => None,
        }
    }

    /// Check if every value of this type is an instance of `other`
    pub fn instance_of(&self, other: &SeqType) -> bool {
        self.occ.instance_of(other.occ)
            && (self.is_empty_sequence() || self.item.instance_of(other.item))
    }

    /// Greatest lower bound of both types
    ///
    /// Returns `None` if no value can be an instance of both. When only the
    /// item types are disjoint but both types admit the empty sequence, the
    /// result is `empty-sequence()`.
    pub fn intersect(&self, other: &SeqType) -> Option<SeqType> {
        let occ = self.occ.intersect(other.occ)?;
        match self.item.intersect(other.item) {
            Some(item) => Some(SeqType::new(item, occ)),
            None if occ.min() == 0 => Some(SeqType::EMPTY),
            None => None,
        }
    }

    /// Check if a value of this type can be converted to `target`
    ///
    /// Holds whenever [`SeqType::instance_of`] holds, and additionally for the
    /// function conversion paths of the item types.
    pub fn convertible_to(&self, target: &SeqType) -> bool {
        match self.occ.intersect(target.occ) {
            None => false,
            Some(Occurrence::Zero) => true,
            Some(_) => self.item.convertible_to(target.item),
        }
    }

    /// Least upper bound of both types
    pub fn union(&self, other: &SeqType) -> SeqType {
        if self.is_empty_sequence() {
            return other.with_occ(other.occ.union(Occurrence::Zero));
        }
        if other.is_empty_sequence() {
            return self.with_occ(self.occ.union(Occurrence::Zero));
        }
        SeqType::new(self.item.union(other.item), self.occ.union(other.occ))
    }

    /// Type of the concatenation of values of both types
    pub fn concat(&self, other: &SeqType) -> SeqType {
        if self.is_empty_sequence() {
            return *other;
        }
        if other.is_empty_sequence() {
            return *self;
        }
        SeqType::new(self.item.union(other.item), self.occ.add(other.occ))
    }

    /// Check if a runtime value is an instance of this type
    pub fn instance(&self, value: &Value) -> bool {
        self.occ.check(value.len())
            && value
                .iter()
                .all(|item| item.item_type().instance_of(self.item))
    }

    /// Apply function conversion to a value
    pub fn promote(&self, value: Value) -> TypeResult<Value> {
        if self.instance(&value) {
            return Ok(value);
        }
        if !self.occ.check(value.len()) {
            return Err(TypeError::Cardinality {
                found: value.len(),
                to: *self,
            });
        }

        let from = value.seq_type();
        value
            .into_iter()
            .map(|item| item.promote(self.item))
            .collect::<Option<Value>>()
            .ok_or(TypeError::InvalidCast { from, to: *self })
    }
}

impl Default for SeqType {
    fn default() -> Self {
        Self::ITEM_ZM
    }
}

impl fmt::Display for SeqType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty_sequence() {
            f.write_str("empty-sequence()")
        } else {
            write!(f, "{}{}", self.item, self.occ.symbol())
        }
    }
}

impl FromStr for SeqType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "empty-sequence()" {
            return Ok(SeqType::EMPTY);
        }

        let (name, occ) = match s.chars().last() {
            Some('?') => (&s[..s.len() - 1], Occurrence::ZeroOrOne),
            Some('+') => (&s[..s.len() - 1], Occurrence::OneOrMore),
            Some('*') => (&s[..s.len() - 1], Occurrence::ZeroOrMore),
            _ => (s, Occurrence::One),
        };
        Ok(SeqType::new(name.trim_end().parse()?, occ))
    }
}
