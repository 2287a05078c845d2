// Copyright 2026 Relatica Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Runtime values
//!
//! A single tagged enum covers every value the engine evaluates: scalars,
//! tuples (rows), relations (tables), unevaluated programs, and the opaque
//! handles the instruction stream passes to builtins.
//!
//! Text and binary payloads use `Arc` so cloning a row during a scan is
//! cheap. Hash and equality are value-based; floats hash through their bit
//! pattern with NaN normalized so equal values always agree on hash.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::accumulator::AccBlockRef;
use super::row::Row;
use super::types::DataType;
use crate::executor::CompiledExpr;
use crate::storage::LocalTable;

/// A runtime value with type information.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value; the unset placeholder inside merge scratch rows
    None,
    Bool(bool),
    Number(f64),
    Text(Arc<str>),
    Time(DateTime<Utc>),
    Binary(Arc<[u8]>),
    /// A row used as a value (tuple attribute, lookup-context handle)
    Tuple(Row),
    /// A table used as a value (relation attribute, operator result)
    Relation(Box<LocalTable>),
    /// An unevaluated program closed over its compile-time metadata
    Code(Arc<CompiledExpr>),
    /// Handle to a live accumulator block, pushed by `LoadAccBlock`
    AccBlock(AccBlockRef),
}

impl Value {
    /// Create a text value
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(Arc::from(value.into().as_str()))
    }

    /// Create a number value
    pub fn number(value: f64) -> Self {
        Value::Number(value)
    }

    /// The runtime type of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::None => DataType::None,
            Value::Bool(_) => DataType::Bool,
            Value::Number(_) => DataType::Number,
            Value::Text(_) => DataType::Text,
            Value::Time(_) => DataType::Time,
            Value::Binary(_) => DataType::Binary,
            Value::Tuple(_) => DataType::Tuple,
            Value::Relation(_) => DataType::Relation,
            Value::Code(_) => DataType::Code,
            Value::AccBlock(_) => DataType::Pointer,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Total order over values. Same-type scalars compare naturally; tuples
    /// compare lexicographically; anything else falls back to a stable but
    /// arbitrary order so sort keys stay deterministic.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => compare_floats(*a, *b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Time(a), Value::Time(b)) => a.cmp(b),
            (Value::Binary(a), Value::Binary(b)) => a.cmp(b),
            (Value::Tuple(a), Value::Tuple(b)) => {
                for (x, y) in a.values().iter().zip(b.values().iter()) {
                    let ord = x.compare(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.degree().cmp(&b.degree())
            }
            (Value::Relation(a), Value::Relation(b)) => a.cardinality().cmp(&b.cardinality()),
            (Value::Code(a), Value::Code(b)) => a.serial().cmp(&b.serial()),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::None => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::Text(_) => 3,
            Value::Time(_) => 4,
            Value::Binary(_) => 5,
            Value::Tuple(_) => 6,
            Value::Relation(_) => 7,
            Value::Code(_) => 8,
            Value::AccBlock(_) => 9,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            // NaN equals itself so hash/eq stay consistent for index keys
            (Value::Number(a), Value::Number(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Relation(a), Value::Relation(b)) => a == b,
            (Value::Code(a), Value::Code(b)) => a.serial() == b.serial(),
            (Value::AccBlock(a), Value::AccBlock(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::None => state.write_u8(0),
            Value::Bool(b) => b.hash(state),
            Value::Number(n) => {
                // normalize -0.0 so it hashes like 0.0
                let bits = if *n == 0.0 { 0u64 } else { n.to_bits() };
                bits.hash(state);
            }
            Value::Text(s) => s.hash(state),
            Value::Time(t) => t.hash(state),
            Value::Binary(b) => b.hash(state),
            Value::Tuple(r) => r.hash(state),
            Value::Relation(t) => {
                state.write_u64(t.heading().content_hash());
                state.write_usize(t.cardinality());
            }
            Value::Code(c) => c.serial().hash(state),
            Value::AccBlock(b) => (Rc::as_ptr(b) as usize).hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("none"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "'{s}'"),
            Value::Time(t) => write!(f, "{t}"),
            Value::Binary(b) => write!(f, "b[{}]", b.len()),
            Value::Tuple(r) => write!(f, "{r}"),
            Value::Relation(t) => write!(f, "{t}"),
            Value::Code(c) => write!(f, "code#{}", c.serial()),
            Value::AccBlock(_) => f.write_str("accblock"),
        }
    }
}

fn compare_floats(a: f64, b: f64) -> Ordering {
    match a.partial_cmp(&b) {
        Some(ord) => ord,
        // NaN sorts after every real number, equal to itself
        None => match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => Ordering::Equal,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    #[test]
    fn scalar_equality_and_hash() {
        let mut map: FxHashMap<Value, i32> = FxHashMap::default();
        map.insert(Value::Number(1.5), 1);
        map.insert(Value::text("a"), 2);
        assert_eq!(map.get(&Value::Number(1.5)), Some(&1));
        assert_eq!(map.get(&Value::text("a")), Some(&2));
        assert_eq!(map.get(&Value::Number(2.0)), None);
    }

    #[test]
    fn negative_zero_hashes_like_zero() {
        let mut map: FxHashMap<Value, i32> = FxHashMap::default();
        map.insert(Value::Number(0.0), 1);
        assert_eq!(map.get(&Value::Number(-0.0)), Some(&1));
    }

    #[test]
    fn float_compare_handles_nan() {
        assert_eq!(compare_floats(1.0, 2.0), Ordering::Less);
        assert_eq!(compare_floats(f64::NAN, 1.0), Ordering::Greater);
        assert_eq!(compare_floats(f64::NAN, f64::NAN), Ordering::Equal);
    }

    #[test]
    fn total_order_across_types_is_stable() {
        let a = Value::Bool(true);
        let b = Value::Number(0.0);
        assert_eq!(a.compare(&b), b.compare(&a).reverse());
    }
}
