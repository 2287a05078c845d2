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

//! Runtime data types
//!
//! Every value carries one of these types. `None` stands for an unknown or
//! void type; an expression declared as `None` is exempt from return-type
//! checking.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::heading::Heading;
use super::row::Row;
use super::value::Value;
use crate::storage::LocalTable;

/// Closed set of runtime types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Unknown or void; disables return-type checking
    None,
    Bool,
    Number,
    Text,
    Time,
    Binary,
    /// A single row bound to a heading
    Tuple,
    /// A table value
    Relation,
    /// An unevaluated program
    Code,
    /// An opaque runtime handle (lookup context, accumulator block)
    Pointer,
}

impl DataType {
    /// The default value substituted when an evaluation cannot produce a
    /// real one (unfinalized folds, out-of-group window offsets).
    pub fn default_value(&self) -> Value {
        match self {
            DataType::None | DataType::Code | DataType::Pointer => Value::None,
            DataType::Bool => Value::Bool(false),
            DataType::Number => Value::Number(0.0),
            DataType::Text => Value::Text(Arc::from("")),
            DataType::Time => Value::Time(DateTime::<Utc>::UNIX_EPOCH),
            DataType::Binary => Value::Binary(Arc::from(&[][..])),
            DataType::Tuple => Value::Tuple(Row::empty()),
            DataType::Relation => Value::Relation(Box::new(LocalTable::new(Heading::empty()))),
        }
    }

    /// True for types that participate in ordering comparisons.
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            DataType::Bool | DataType::Number | DataType::Text | DataType::Time | DataType::Binary
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::None => "none",
            DataType::Bool => "bool",
            DataType::Number => "number",
            DataType::Text => "text",
            DataType::Time => "time",
            DataType::Binary => "binary",
            DataType::Tuple => "tuple",
            DataType::Relation => "relation",
            DataType::Code => "code",
            DataType::Pointer => "pointer",
        };
        f.write_str(name)
    }
}
