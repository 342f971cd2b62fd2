//! Function conversion rules
//!
//! Values bound to typed variables and parameters may be converted instead of
//! rejected. The permitted paths are:
//! - Atomization of nodes to `xs:untypedAtomic`
//! - Cast of `xs:untypedAtomic` to the expected atomic type
//! - Numeric promotion (`xs:decimal` -> `xs:float` -> `xs:double`)
//! - URI promotion (`xs:anyURI` -> `xs:string`)

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;

use crate::{Item, ItemType};

impl ItemType {
    /// Check if a value statically typed as `self` may be converted to `target`
    ///
    /// This also holds when `target` is a subtype of `self`: the static type
    /// is only an upper bound and the runtime value may still match.
    pub fn convertible_to(&self, target: ItemType) -> bool {
        if self.instance_of(target) || target.instance_of(*self) {
            return true;
        }

        if self.is_node() || *self == ItemType::Untyped {
            return target.is_atomic();
        }

        match (self, target) {
            (ItemType::Decimal | ItemType::Integer, ItemType::Float | ItemType::Double) => true,
            (ItemType::Float, ItemType::Double) => true,
            (ItemType::AnyUri, ItemType::String) => true,
            _ => false,
        }
    }
}

impl Item {
    /// Atomize this item; nodes yield their string value as `xs:untypedAtomic`
    pub fn atomize(self) -> Item {
        match self {
            Item::Node(node) => Item::Untyped(node.text),
            other => other,
        }
    }

    /// Apply function conversion, `None` if no conversion path exists
    pub fn promote(self, target: ItemType) -> Option<Item> {
        if self.item_type().instance_of(target) {
            return Some(self);
        }
        if !target.is_atomic() {
            return None;
        }

        match self.atomize() {
            Item::Untyped(s) => cast_untyped(&s, target),
            item if item.item_type().instance_of(target) => Some(item),
            Item::Integer(i) => match target {
                ItemType::Double => Some(Item::Double(i as f64)),
                ItemType::Float => Some(Item::Float(i as f32)),
                _ => None,
            },
            Item::Decimal(d) => match target {
                ItemType::Double => d.to_f64().map(Item::Double),
                ItemType::Float => d.to_f32().map(Item::Float),
                _ => None,
            },
            Item::Float(f) if target == ItemType::Double => Some(Item::Double(f as f64)),
            Item::AnyUri(s) if target == ItemType::String => Some(Item::String(s)),
            _ => None,
        }
    }
}

/// Cast an untyped atomic value to the given atomic type
fn cast_untyped(s: &str, target: ItemType) -> Option<Item> {
    let trimmed = s.trim();
    match target {
        ItemType::AnyAtomic | ItemType::Untyped => Some(Item::Untyped(s.to_string())),
        ItemType::String => Some(Item::String(s.to_string())),
        ItemType::AnyUri => Some(Item::AnyUri(trimmed.to_string())),
        ItemType::Boolean => match trimmed {
            "true" | "1" => Some(Item::Boolean(true)),
            "false" | "0" => Some(Item::Boolean(false)),
            _ => None,
        },
        ItemType::Integer => trimmed.parse::<i64>().ok().map(Item::Integer),
        ItemType::Decimal => Decimal::from_str(trimmed).ok().map(Item::Decimal),
        ItemType::Double => parse_float(trimmed).map(Item::Double),
        ItemType::Float => parse_float(trimmed).map(|d| Item::Float(d as f32)),
        ItemType::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .map(Item::Date),
        ItemType::DateTime => NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(Item::DateTime),
        _ => None,
    }
}

fn parse_float(s: &str) -> Option<f64> {
    match s {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => s.parse::<f64>().ok(),
    }
}
