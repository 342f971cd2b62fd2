//! Runtime items and values
//!
//! A [`Value`] is a flat sequence of [`Item`]s. Single items are by far the
//! most common values, so the sequence is stored inline for one item.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::{ItemType, Occurrence, QName, SeqType};

/// Kind of a node item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Element,
    Attribute,
    Text,
    Document,
}

impl NodeKind {
    pub const fn item_type(&self) -> ItemType {
        match self {
            Self::Element => ItemType::Element,
            Self::Attribute => ItemType::Attribute,
            Self::Text => ItemType::Text,
            Self::Document => ItemType::Document,
        }
    }
}

/// A lightweight node: kind, optional name and its string value
///
/// Nodes only take part in typing through their kind and atomized value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub name: Option<QName>,
    /// String value, the result of atomization
    pub text: String,
}

impl Node {
    pub fn element(name: impl Into<QName>, text: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Element,
            name: Some(name.into()),
            text: text.into(),
        }
    }

    pub fn attribute(name: impl Into<QName>, text: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Attribute,
            name: Some(name.into()),
            text: text.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Text,
            name: None,
            text: text.into(),
        }
    }
}

/// A single item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Item {
    Untyped(String),
    String(String),
    AnyUri(String),
    Boolean(bool),
    Decimal(Decimal),
    Integer(i64),
    Double(f64),
    Float(f32),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Node(Node),
}

impl Item {
    /// Dynamic type of this item
    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Untyped(_) => ItemType::Untyped,
            Self::String(_) => ItemType::String,
            Self::AnyUri(_) => ItemType::AnyUri,
            Self::Boolean(_) => ItemType::Boolean,
            Self::Decimal(_) => ItemType::Decimal,
            Self::Integer(_) => ItemType::Integer,
            Self::Double(_) => ItemType::Double,
            Self::Float(_) => ItemType::Float,
            Self::Date(_) => ItemType::Date,
            Self::DateTime(_) => ItemType::DateTime,
            Self::Node(node) => node.kind.item_type(),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn untyped(value: impl Into<String>) -> Self {
        Self::Untyped(value.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Untyped(s) | Self::String(s) | Self::AnyUri(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Untyped(s) => write!(f, "xs:untypedAtomic(\"{}\")", s),
            Self::String(s) => write!(f, "\"{}\"", s),
            Self::AnyUri(s) => write!(f, "xs:anyURI(\"{}\")", s),
            Self::Boolean(b) => write!(f, "{}()", b),
            Self::Decimal(d) => write!(f, "{}", d),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Double(d) => write!(f, "{:e}", d),
            Self::Float(v) => write!(f, "xs:float({})", v),
            Self::Date(d) => write!(f, "xs:date(\"{}\")", d),
            Self::DateTime(dt) => write!(f, "xs:dateTime(\"{}\")", dt.format("%Y-%m-%dT%H:%M:%S")),
            Self::Node(node) => match &node.name {
                Some(name) => write!(f, "{}({})", node.kind.item_type().name().trim_end_matches("()"), name),
                None => write!(f, "{}", node.kind.item_type()),
            },
        }
    }
}

/// A sequence of items
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Value {
    items: SmallVec<[Item; 1]>,
}

impl Value {
    /// The empty sequence
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(item: Item) -> Self {
        let mut items = SmallVec::new();
        items.push(item);
        Self { items }
    }

    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    pub fn integer(value: i64) -> Self {
        Self::single(Item::Integer(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::single(Item::string(value))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    /// Concatenate two sequences
    pub fn concat(mut self, other: Value) -> Value {
        self.items.extend(other.items);
        self
    }

    /// Most specific sequence type describing this value
    pub fn seq_type(&self) -> SeqType {
        let mut iter = self.items.iter().map(Item::item_type);
        match iter.next() {
            None => SeqType::EMPTY,
            Some(first) => {
                let item = iter.fold(first, |acc, ty| acc.union(ty));
                SeqType::new(item, Occurrence::exactly(self.items.len()))
            }
        }
    }
}

impl From<Item> for Value {
    fn from(item: Item) -> Self {
        Self::single(item)
    }
}

impl IntoIterator for Value {
    type Item = Item;
    type IntoIter = smallvec::IntoIter<[Item; 1]>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<Item> for Value {
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        Self::from_items(iter)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.len() == 1 {
            return write!(f, "{}", self.items[0]);
        }
        let items: Vec<String> = self.items.iter().map(|i| i.to_string()).collect();
        write!(f, "({})", items.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_seq_type() {
        assert_eq!(Value::empty().seq_type(), SeqType::EMPTY);
        assert_eq!(
            Value::integer(5).seq_type(),
            SeqType::new(ItemType::Integer, Occurrence::One)
        );

        let mixed = Value::from_items([Item::Integer(1), Item::Decimal(Decimal::new(25, 1))]);
        assert_eq!(
            mixed.seq_type(),
            SeqType::new(ItemType::Decimal, Occurrence::OneOrMore)
        );

        let nodes = Value::from_items([
            Item::Node(Node::text("a")),
            Item::Node(Node::element("b", "c")),
        ]);
        assert_eq!(nodes.seq_type().item, ItemType::Node);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::integer(5).to_string(), "5");
        assert_eq!(Value::empty().to_string(), "()");
        assert_eq!(
            Value::from_items([Item::Integer(1), Item::string("a")]).to_string(),
            "(1, \"a\")"
        );
        assert_eq!(Item::Node(Node::element("a", "x")).to_string(), "element(a)");
    }
}
