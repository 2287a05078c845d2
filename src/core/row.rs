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

//! Rows: ordered value vectors bound to a heading
//!
//! Hash code and equality come purely from the values (each value XORed in),
//! never from the heading reference, so rows built against differently
//! ordered headings compare equal whenever their named values agree.
//!
//! A row may carry two transient attachments, set only while its table is
//! being iterated: the ordinal it was read at, and a window context (the
//! ordered index plus a snapshot of the source rows) used by lead/lag
//! functions during an ordered transform. Neither participates in hash or
//! equality.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use rustc_hash::FxHasher;

use super::accumulator::AccBlockRef;
use super::error::{Error, Result};
use super::heading::Heading;
use super::value::Value;
use crate::executor::{CompiledExpr, Evaluator};
use crate::storage::{OffsetMode, OrderedIndex};

/// Ordering context attached to rows during an ordered transform so window
/// functions can reach sibling rows.
#[derive(Debug, Clone)]
pub struct WindowCtx {
    /// Sorted index over the ordering expressions
    pub index: Rc<OrderedIndex>,
    /// Source rows addressed by table ordinal
    pub rows: Rc<Vec<Row>>,
}

/// A row of data: a heading and one value per column, in heading order.
#[derive(Debug, Clone)]
pub struct Row {
    heading: Heading,
    values: Vec<Value>,
    ord: Option<usize>,
    window: Option<Rc<WindowCtx>>,
}

impl Row {
    /// The empty row over the empty heading.
    pub fn empty() -> Row {
        Row {
            heading: Heading::empty(),
            values: Vec::new(),
            ord: None,
            window: None,
        }
    }

    /// A table row: values supplied in the heading's own order.
    pub fn new(heading: Heading, values: Vec<Value>) -> Result<Row> {
        if values.len() != heading.degree() {
            return Err(Error::DegreeMismatch {
                expected: heading.degree(),
                got: values.len(),
            });
        }
        Ok(Row {
            heading,
            values,
            ord: None,
            window: None,
        })
    }

    /// An argument row: caller-supplied order kept against a plain heading,
    /// no reordering. Used to bind function-call arguments.
    pub fn untyped(heading: Heading, values: Vec<Value>) -> Result<Row> {
        Row::new(heading, values)
    }

    pub fn heading(&self) -> &Heading {
        &self.heading
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn degree(&self) -> usize {
        self.values.len()
    }

    /// Lookup-context resolution: the value under this name, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.heading.find(name).map(|i| &self.values[i])
    }

    /// Ordinal in the owning table, tagged during iteration.
    pub fn ord(&self) -> Option<usize> {
        self.ord
    }

    pub(crate) fn with_ord(mut self, ord: usize) -> Row {
        self.ord = Some(ord);
        self
    }

    pub(crate) fn attach_window(&mut self, ctx: Rc<WindowCtx>) {
        self.window = Some(ctx);
    }

    /// Replace the values in place. This changes the hash code, so a table
    /// index holding this row must remove it first and reinsert after;
    /// [`LocalTable`](crate::storage::LocalTable) wraps both steps in one
    /// atomic replace.
    pub(crate) fn replace_values(&mut self, values: Vec<Value>) -> Result<()> {
        if values.len() != self.values.len() {
            return Err(Error::DegreeMismatch {
                expected: self.values.len(),
                got: values.len(),
            });
        }
        self.values = values;
        Ok(())
    }

    /// New row re-selecting values per a precomputed index array.
    pub fn project(&self, heading: Heading, move_index: &[usize]) -> Result<Row> {
        if move_index.len() != heading.degree() {
            return Err(Error::DegreeMismatch {
                expected: heading.degree(),
                got: move_index.len(),
            });
        }
        let values = move_index.iter().map(|&i| self.values[i].clone()).collect();
        Row::new(heading, values)
    }

    /// New row moving values where the index has a source; absent slots
    /// stay unset for a later [`merge`](Row::merge).
    pub fn transform_move(&self, heading: Heading, index: &[Option<usize>]) -> Result<Row> {
        let values = index
            .iter()
            .map(|slot| match slot {
                Some(i) => self.values[*i].clone(),
                None => Value::None,
            })
            .collect();
        Row::new(heading, values)
    }

    /// Fill values from `other` wherever the index names a source column,
    /// keeping this row's value otherwise.
    pub fn merge(&self, other: &Row, index: &[Option<usize>]) -> Result<Row> {
        let mut values = self.values.clone();
        for (i, slot) in index.iter().enumerate() {
            if let Some(j) = slot {
                values[i] = other.values[*j].clone();
            }
        }
        Row::new(self.heading.clone(), values)
    }

    /// Match test over the columns the index pairs up.
    pub fn is_match(&self, other: &Row, index: &[Option<usize>]) -> bool {
        index.iter().enumerate().all(|(i, slot)| match slot {
            Some(j) => self.values[i] == other.values[*j],
            None => true,
        })
    }

    /// New row by evaluating expressions against `self` as lookup context.
    /// Every expression is evaluated; folds yield their type default here
    /// (no accumulation).
    pub fn transform(
        &self,
        heading: &Heading,
        exprs: &[CompiledExpr],
        ev: &mut Evaluator<'_>,
    ) -> Result<Row> {
        self.transform_inner(heading, exprs, ev, None)
    }

    /// Like [`transform`](Row::transform) but fold expressions accumulate
    /// into (and finalize from) the supplied block.
    pub fn transform_aggregate(
        &self,
        heading: &Heading,
        accblock: &AccBlockRef,
        exprs: &[CompiledExpr],
        ev: &mut Evaluator<'_>,
    ) -> Result<Row> {
        self.transform_inner(heading, exprs, ev, Some(accblock))
    }

    fn transform_inner(
        &self,
        heading: &Heading,
        exprs: &[CompiledExpr],
        ev: &mut Evaluator<'_>,
        accblock: Option<&AccBlockRef>,
    ) -> Result<Row> {
        // evaluate in expression order (fold side effects), then place by
        // name since the canonical heading order may differ
        let mut slots: Vec<Option<Value>> = vec![None; heading.degree()];
        for expr in exprs {
            let value = match accblock {
                Some(block) if expr.has_fold() => expr.eval_has_fold(ev, Some(self), block, 0)?,
                _ => expr.eval_open(ev, Some(self))?,
            };
            let pos = heading
                .find(expr.name())
                .ok_or_else(|| Error::ColumnNotFound(expr.name().to_string()))?;
            slots[pos] = Some(value);
        }
        let values = slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or_else(|| Error::ColumnNotFound(heading.columns()[i].name().to_string()))
            })
            .collect::<Result<Vec<Value>>>()?;
        Row::new(heading.clone(), values)
    }

    /// Window access: evaluate `expr` against the sibling row `index` steps
    /// away per `mode`, or the expression type's default when the target
    /// falls outside the current group.
    pub fn value_offset(
        &self,
        expr: &CompiledExpr,
        index: usize,
        mode: OffsetMode,
        ev: &mut Evaluator<'_>,
    ) -> Result<Value> {
        let window = self.window.clone().ok_or(Error::MissingWindow)?;
        match window.index.offset(self, index, mode)? {
            None => Ok(expr.return_type().default_value()),
            Some(ord) => {
                let sibling = window.rows.get(ord).ok_or(Error::RowNotIndexed)?;
                expr.eval_open(ev, Some(sibling))
            }
        }
    }

    /// Ordinal of this row: absolute table position, or offset from the
    /// start of its group when `grouped` is set.
    pub fn ordinal(&self, grouped: bool) -> Result<Value> {
        if grouped {
            let window = self.window.as_ref().ok_or(Error::MissingWindow)?;
            Ok(Value::Number(window.index.ordinal_in_group(self)? as f64))
        } else {
            let ord = self.ord.ok_or(Error::RowNotIndexed)?;
            Ok(Value::Number(ord as f64))
        }
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        if self.degree() != other.degree() || self.heading != other.heading {
            return false;
        }
        // headings are set-equal; align values by name
        other.heading.columns().iter().enumerate().all(|(i, col)| {
            self.heading
                .find_column(col)
                .is_some_and(|x| self.values[x] == other.values[i])
        })
    }
}

impl Eq for Row {}

impl Hash for Row {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // XOR so the hash is independent of column order
        let mut hash = 0u64;
        for value in &self.values {
            let mut hasher = FxHasher::default();
            value.hash(&mut hasher);
            hash ^= hasher.finish();
        }
        state.write_u64(hash);
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, (col, value)) in self.heading.columns().iter().zip(&self.values).enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}:{}", col.name(), value)?;
        }
        write!(f, ")")
    }
}
