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

//! Relatica: an in-memory relational algebra engine with a bytecode
//! expression evaluator.
//!
//! A front end compiles query and update statements into compact programs;
//! this crate executes them against relations. The pieces, leaf first:
//!
//! - [`core`]: the data model. Typed columns, order-independent headings
//!   (structurally interned in tuple mode), rows whose hash and equality
//!   come purely from their values, and the accumulator blocks that drive
//!   aggregation.
//! - [`catalog`]: the named-variable store the evaluator's load
//!   instructions consult.
//! - [`executor`]: compiled expressions, the decoded instruction set, the
//!   closed builtin enum, and the stack-machine interpreter with its
//!   lookup-context chain.
//! - [`storage`]: the abstract relation contract, the in-memory table with
//!   every monadic, dyadic, and update operator, and the ordered index
//!   behind window functions.
//!
//! Execution is single threaded and synchronous. Nested programs (function
//! invocation, conditionals, do blocks) re-enter the interpreter
//! recursively; every lookup-context push is released on every exit path.
//!
//! # Example
//!
//! ```
//! use relatica::catalog::MemoryCatalog;
//! use relatica::core::{Column, DataType, Heading, Value};
//! use relatica::executor::{CompiledExpr, Evaluator};
//! use relatica::storage::{LocalTable, Relation};
//!
//! # fn main() -> relatica::core::Result<()> {
//! let heading = Heading::tuple(vec![
//!     Column::new("x", DataType::Number),
//!     Column::new("y", DataType::Text),
//! ])?;
//! let mut table = LocalTable::new(heading.clone());
//! table.add_values(vec![Value::Number(1.0), Value::text("a")])?;
//! table.add_values(vec![Value::Number(2.0), Value::text("b")])?;
//!
//! let catalog = MemoryCatalog::new();
//! let mut ev = Evaluator::new(&catalog);
//! let projected = table.project(
//!     &[CompiledExpr::renaming("x", "x", DataType::Number)],
//!     &mut ev,
//! )?;
//! assert_eq!(projected.cardinality(), 2);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod core;
pub mod executor;
pub mod storage;

pub use crate::core::{Error, Result};
