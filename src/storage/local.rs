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

//! In-memory table backend
//!
//! A mutable, duplicate-free row collection: an ordered row list plus a
//! hash index from row to position. The invariant `index[rows[i]] == i`
//! holds for every live row; a row's hash changes when its values change,
//! so every mutation removes the key, applies the change, and reinserts,
//! all inside one method.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use super::ordered_index::OrderedIndex;
use super::traits::{JoinOps, Relation};
use crate::core::{AccumulatorBlock, DataType, Error, Heading, Result, Row, Value, WindowCtx};
use crate::executor::{CompiledExpr, Evaluator};

/// The local (in-memory) implementation of the relation contract.
#[derive(Debug, Clone, Default)]
pub struct LocalTable {
    heading: Heading,
    rows: Vec<Row>,
    index: FxHashMap<Row, usize>,
}

impl LocalTable {
    pub fn new(heading: Heading) -> LocalTable {
        LocalTable {
            heading,
            rows: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    pub fn from_rows(heading: Heading, rows: impl IntoIterator<Item = Row>) -> Result<LocalTable> {
        let mut table = LocalTable::new(heading);
        for row in rows {
            table.add_row(&row)?;
        }
        Ok(table)
    }

    /// Copy any backend into a local table.
    pub fn materialize(other: &dyn Relation) -> Result<LocalTable> {
        if let Some(local) = other.as_local() {
            return Ok(local.clone());
        }
        LocalTable::from_rows(other.heading().clone(), other.rows())
    }

    /// Materialize with a lookup context active, for function-argument
    /// relations whose source iteration resolves correlated fields.
    pub fn materialize_with(
        other: &dyn Relation,
        lookup: &Row,
        ev: &mut Evaluator<'_>,
    ) -> Result<LocalTable> {
        if let Some(local) = other.as_local() {
            return Ok(local.clone());
        }
        ev.with_lookup(lookup, |_| {
            LocalTable::from_rows(other.heading().clone(), other.rows())
        })
    }

    fn view<'a>(other: &'a dyn Relation) -> Result<Cow<'a, LocalTable>> {
        match other.as_local() {
            Some(local) => Ok(Cow::Borrowed(local)),
            None => Ok(Cow::Owned(LocalTable::materialize(other)?)),
        }
    }

    pub fn heading(&self) -> &Heading {
        &self.heading
    }

    pub fn degree(&self) -> usize {
        self.heading.degree()
    }

    pub fn cardinality(&self) -> usize {
        self.rows.len()
    }

    pub fn row_list(&self) -> &[Row] {
        &self.rows
    }

    pub fn contains(&self, row: &Row) -> bool {
        self.index.contains_key(row)
    }

    /// Add a row whose values may be in a different column order. Returns
    /// false when an equal row is already present.
    pub fn add_row(&mut self, row: &Row) -> Result<bool> {
        if *row.heading() != self.heading {
            return Err(Error::HeadingMismatch);
        }
        let values = self
            .heading
            .columns()
            .iter()
            .map(|c| {
                row.heading()
                    .find_column(c)
                    .map(|i| row.values()[i].clone())
                    .ok_or_else(|| Error::ColumnNotFound(c.name().to_string()))
            })
            .collect::<Result<Vec<Value>>>()?;
        Ok(self.add_raw(Row::new(self.heading.clone(), values)?))
    }

    /// Add values already in heading order.
    pub fn add_values(&mut self, values: Vec<Value>) -> Result<bool> {
        Ok(self.add_raw(Row::new(self.heading.clone(), values)?))
    }

    // row values must already be in heading order
    fn add_raw(&mut self, row: Row) -> bool {
        if self.index.contains_key(&row) {
            return false;
        }
        self.index.insert(row.clone(), self.rows.len());
        self.rows.push(row);
        true
    }

    // atomic replace: the key leaves the index before the values change
    fn replace_at(&mut self, ord: usize, new: Row) -> Result<()> {
        let old = self.rows.get(ord).ok_or(Error::RowNotIndexed)?;
        self.index.remove(old);
        self.index.insert(new.clone(), ord);
        self.rows[ord] = new;
        Ok(())
    }

    // swap-remove keeping the index consistent
    fn delete_at(&mut self, ord: usize) {
        self.index.remove(&self.rows[ord]);
        let last = self.rows.len() - 1;
        if ord != last {
            self.rows.swap(ord, last);
            self.index.insert(self.rows[ord].clone(), ord);
        }
        self.rows.pop();
    }

    fn delete_row(&mut self, row: &Row) -> Result<()> {
        let ord = self.index.get(row).copied().ok_or(Error::RowNotIndexed)?;
        self.delete_at(ord);
        Ok(())
    }

    fn clear(&mut self) {
        self.rows.clear();
        self.index.clear();
    }

    // any row matching on the paired columns
    fn has_match(&self, row: &Row, index: &[Option<usize>]) -> bool {
        self.rows.iter().any(|r| r.is_match(row, index))
    }

    /// First value of the first row; the column default when empty.
    pub fn lift(&self) -> Value {
        if self.degree() == 0 {
            return Value::None;
        }
        match self.rows.first() {
            Some(row) => row.values()[0].clone(),
            None => self.heading.columns()[0].data_type().default_value(),
        }
    }

    // every column of `target` located in `source`, no absences allowed
    fn full_index(target: &Heading, source: &Heading) -> Result<Vec<usize>> {
        target
            .columns()
            .iter()
            .map(|c| {
                source
                    .find_column(c)
                    .ok_or_else(|| Error::ColumnNotFound(c.name().to_string()))
            })
            .collect()
    }

    // ========================================================
    // Monadic operators
    // ========================================================

    fn project_impl(&self, exprs: &[CompiledExpr], ev: &mut Evaluator<'_>) -> Result<LocalTable> {
        let newheading = Heading::from_exprs(exprs)?;
        let mut newtable = LocalTable::new(newheading.clone());
        for row in &self.rows {
            let newrow = row.transform(&newheading, exprs, ev)?;
            newtable.add_raw(newrow);
        }
        debug!(result = %newtable, "project");
        Ok(newtable)
    }

    fn rename_impl(&self, exprs: &[CompiledExpr]) -> Result<LocalTable> {
        // the renamed plain heading keeps this table's column positions;
        // canonicalizing gives the move order into the new tuple heading
        let renamed = self.heading.rename(exprs)?;
        let newheading = Heading::tuple(renamed.columns().to_vec())?;
        let move_index = Self::full_index(&newheading, &renamed)?;
        let mut newtable = LocalTable::new(newheading.clone());
        for row in &self.rows {
            let values = move_index.iter().map(|&i| row.values()[i].clone()).collect();
            newtable.add_raw(Row::new(newheading.clone(), values)?);
        }
        debug!(result = %newtable, "rename");
        Ok(newtable)
    }

    fn restrict_impl(&self, pred: &CompiledExpr, ev: &mut Evaluator<'_>) -> Result<LocalTable> {
        let mut newtable = LocalTable::new(self.heading.clone());
        for row in &self.rows {
            if pred.eval_pred(ev, Some(row))? {
                newtable.add_raw(row.clone());
            }
        }
        debug!(result = %newtable, "restrict");
        Ok(newtable)
    }

    fn transform_impl(
        &self,
        heading: &Heading,
        exprs: &[CompiledExpr],
        ev: &mut Evaluator<'_>,
    ) -> Result<LocalTable> {
        if exprs.len() != heading.degree() {
            return Err(Error::DegreeMismatch {
                expected: heading.degree(),
                got: exprs.len(),
            });
        }
        let mut newtable = LocalTable::new(heading.clone());
        for row in &self.rows {
            newtable.add_raw(row.transform(heading, exprs, ev)?);
        }
        debug!(result = %newtable, "transform");
        Ok(newtable)
    }

    // Group rows by the non-fold transform of each row, one accumulator
    // block per group. Each later row of a group replaces the group's row
    // in place, so non-fold columns end up from the group's last row.
    fn transform_aggregate_impl(
        &self,
        heading: &Heading,
        exprs: &[CompiledExpr],
        ev: &mut Evaluator<'_>,
    ) -> Result<LocalTable> {
        let mut newtable = LocalTable::new(heading.clone());
        let mut groups: FxHashMap<Row, usize> = FxHashMap::default();
        let mut blocks = Vec::new();

        for row in &self.rows {
            // fold columns evaluate to their defaults here, so this keys
            // the group by the non-fold columns alone
            let key = row.transform(heading, exprs, ev)?;
            match groups.get(&key) {
                None => {
                    let block = AccumulatorBlock::shared();
                    let newrow = row.transform_aggregate(heading, &block, exprs, ev)?;
                    newtable.add_raw(newrow);
                    groups.insert(key, newtable.cardinality() - 1);
                    blocks.push(block);
                }
                Some(&ord) => {
                    let block = blocks[ord].clone();
                    let newrow = row.transform_aggregate(heading, &block, exprs, ev)?;
                    newtable.replace_at(ord, newrow)?;
                }
            }
        }
        debug!(result = %newtable, "transform_aggregate");
        Ok(newtable)
    }

    // Sort first, then accumulate in index order with a fresh block at
    // every group break. Rows carry the ordering context so window
    // builtins can reach their siblings.
    fn transform_ordered_impl(
        &self,
        heading: &Heading,
        exprs: &[CompiledExpr],
        order_exprs: &[CompiledExpr],
        ev: &mut Evaluator<'_>,
    ) -> Result<LocalTable> {
        let mut index = OrderedIndex::new(order_exprs, &self.heading)?;
        for (ord, row) in self.rows.iter().enumerate() {
            index.insert(row, ord);
        }
        let snapshot: Rc<Vec<Row>> = Rc::new(
            self.rows
                .iter()
                .enumerate()
                .map(|(ord, row)| row.clone().with_ord(ord))
                .collect(),
        );
        let ctx = Rc::new(WindowCtx {
            index: Rc::new(index),
            rows: snapshot.clone(),
        });

        let mut newtable = LocalTable::new(heading.clone());
        let mut block = AccumulatorBlock::shared();
        for (ord, is_break) in ctx.index.ordinals() {
            if is_break {
                block = AccumulatorBlock::shared();
            }
            let mut row = snapshot[ord].clone();
            row.attach_window(ctx.clone());
            let newrow = row.transform_aggregate(heading, &block, exprs, ev)?;
            newtable.add_raw(newrow);
        }
        debug!(result = %newtable, "transform_ordered");
        Ok(newtable)
    }

    fn recurse_impl(&self, expr: &CompiledExpr, ev: &mut Evaluator<'_>) -> Result<LocalTable> {
        if expr.return_type() != DataType::Relation {
            return Err(Error::TypeMismatch {
                expected: DataType::Relation,
                got: expr.return_type(),
            });
        }
        let mut newtable = self.clone();
        // the row list grows while we walk it; discovered rows are visited
        // within this same pass
        let mut ord = 0;
        while ord < newtable.rows.len() {
            let row = newtable.rows[ord].clone();
            match expr.eval_open(ev, Some(&row))? {
                Value::Relation(found) => {
                    for newrow in found.row_list() {
                        newtable.add_row(newrow)?;
                    }
                }
                other => {
                    return Err(Error::TypeMismatch {
                        expected: DataType::Relation,
                        got: other.data_type(),
                    })
                }
            }
            ord += 1;
        }
        debug!(result = %newtable, "recurse");
        Ok(newtable)
    }

    // ========================================================
    // Dyadic operators
    // ========================================================

    // Nested loop over the cross product, keeping rows that agree on the
    // common columns, projected onto the merged heading.
    fn generalized_join(
        &self,
        other: &LocalTable,
        newheading: &Heading,
    ) -> Result<LocalTable> {
        let cmp_index = self.heading.make_index(&other.heading);
        let this_index = newheading.make_index(&self.heading);
        let other_index = newheading.make_index(&other.heading);

        let mut newtable = LocalTable::new(newheading.clone());
        for row1 in &self.rows {
            for row2 in &other.rows {
                if row1.is_match(row2, &cmp_index) {
                    let newrow = row1
                        .transform_move(newheading.clone(), &this_index)?
                        .merge(row2, &other_index)?;
                    newtable.add_raw(newrow);
                }
            }
        }
        debug!(result = %newtable, "generalized_join");
        Ok(newtable)
    }

    // Hash the right side on the join columns, keep left rows whose
    // projection is absent.
    fn generalized_antijoin(
        &self,
        other: &LocalTable,
        newheading: &Heading,
        joinheading: &Heading,
    ) -> Result<LocalTable> {
        let right_keys = other.build_key_set(joinheading)?;
        let cmp_index = Self::full_index(joinheading, &self.heading)?;
        let move_index = Self::full_index(newheading, &self.heading)?;

        let mut newtable = LocalTable::new(newheading.clone());
        for row in &self.rows {
            let key = row.project(joinheading.clone(), &cmp_index)?;
            if !right_keys.contains(&key) {
                newtable.add_raw(row.project(newheading.clone(), &move_index)?);
            }
        }
        debug!(result = %newtable, "generalized_antijoin");
        Ok(newtable)
    }

    // Hash whichever sides the operator needs, projected onto the common
    // heading, then filter and emit.
    fn generalized_set(
        &self,
        other: &LocalTable,
        newheading: &Heading,
        ops: JoinOps,
    ) -> Result<LocalTable> {
        let left_keys = match ops {
            JoinOps::SYMDIFF => Some(self.build_key_set(newheading)?),
            _ => None,
        };
        let right_keys = match ops {
            JoinOps::MINUS | JoinOps::INTERSECT | JoinOps::SYMDIFF => {
                Some(other.build_key_set(newheading)?)
            }
            _ => None,
        };

        let mut newtable = LocalTable::new(newheading.clone());
        let left_move = Self::full_index(newheading, &self.heading)?;
        for row in &self.rows {
            let newrow = row.project(newheading.clone(), &left_move)?;
            let keep = match (ops, &right_keys) {
                (JoinOps::MINUS | JoinOps::SYMDIFF, Some(keys)) => !keys.contains(&newrow),
                (JoinOps::INTERSECT, Some(keys)) => keys.contains(&newrow),
                _ => true,
            };
            if keep {
                newtable.add_raw(newrow);
            }
        }
        if ops == JoinOps::UNION || ops == JoinOps::SYMDIFF {
            let right_move = Self::full_index(newheading, &other.heading)?;
            for row in &other.rows {
                let newrow = row.project(newheading.clone(), &right_move)?;
                let keep = match &left_keys {
                    Some(keys) => !keys.contains(&newrow),
                    None => true,
                };
                if keep {
                    newtable.add_raw(newrow);
                }
            }
        }
        debug!(result = %newtable, "generalized_set");
        Ok(newtable)
    }

    fn build_key_set(&self, keyheading: &Heading) -> Result<FxHashSet<Row>> {
        let index = Self::full_index(keyheading, &self.heading)?;
        let mut keys = FxHashSet::default();
        for row in &self.rows {
            keys.insert(row.project(keyheading.clone(), &index)?);
        }
        Ok(keys)
    }

    // fast path: keep left rows matching the right on its columns
    fn semijoin(&self, other: &LocalTable) -> Result<LocalTable> {
        let cmp_index = other.heading.make_index(&self.heading);
        let mut newtable = LocalTable::new(self.heading.clone());
        for row in &self.rows {
            if other.has_match(row, &cmp_index) {
                newtable.add_raw(row.clone());
            }
        }
        Ok(newtable)
    }

    // fast path: keep left rows with no match on the right
    fn antijoin_fast(&self, other: &LocalTable) -> Result<LocalTable> {
        let cmp_index = other.heading.make_index(&self.heading);
        let mut newtable = LocalTable::new(self.heading.clone());
        for row in &self.rows {
            if !other.has_match(row, &cmp_index) {
                newtable.add_raw(row.clone());
            }
        }
        Ok(newtable)
    }

    // fast path: matching left rows projected onto the left-only heading
    fn divide(&self, other: &LocalTable, newheading: &Heading) -> Result<LocalTable> {
        let cmp_index = other.heading.make_index(&self.heading);
        let move_index = Self::full_index(newheading, &self.heading)?;
        let mut newtable = LocalTable::new(newheading.clone());
        for row in &self.rows {
            if other.has_match(row, &cmp_index) {
                newtable.add_raw(row.project(newheading.clone(), &move_index)?);
            }
        }
        Ok(newtable)
    }

    // fast paths on matching headings
    fn union_fast(&self, other: &LocalTable) -> Result<LocalTable> {
        let mut newtable = self.clone();
        for row in &other.rows {
            newtable.add_row(row)?;
        }
        Ok(newtable)
    }

    fn minus_fast(&self, other: &LocalTable) -> Result<LocalTable> {
        let mut newtable = LocalTable::new(self.heading.clone());
        for row in &self.rows {
            if !other.contains(row) {
                newtable.add_raw(row.clone());
            }
        }
        Ok(newtable)
    }

    fn join_impl(&self, other: &dyn Relation, ops: JoinOps) -> Result<LocalTable> {
        let other = Self::view(other)?;
        let newheading = Heading::merge(ops.merge_op(), &self.heading, other.heading())?;
        match ops {
            JoinOps::DIVIDE => return self.divide(&other, &newheading),
            JoinOps::SEMIJOIN => return self.semijoin(&other),
            JoinOps::RSEMIJOIN => return other.semijoin(self),
            _ => {}
        }
        if ops.has(JoinOps::REV) {
            other.generalized_join(self, &newheading)
        } else {
            self.generalized_join(&other, &newheading)
        }
    }

    fn antijoin_impl(&self, other: &dyn Relation, ops: JoinOps) -> Result<LocalTable> {
        let other = Self::view(other)?;
        match ops {
            JoinOps::ANTIJOIN => return self.antijoin_fast(&other),
            JoinOps::RANTIJOIN => return other.antijoin_fast(self),
            _ => {}
        }
        let joinheading = self.heading.intersect(other.heading())?;
        if ops.has(JoinOps::REV) {
            let newheading = Heading::merge(ops.merge_op(), other.heading(), &self.heading)?;
            other.generalized_antijoin(self, &newheading, &joinheading)
        } else {
            let newheading = Heading::merge(ops.merge_op(), &self.heading, other.heading())?;
            self.generalized_antijoin(&other, &newheading, &joinheading)
        }
    }

    fn set_op_impl(&self, other: &dyn Relation, ops: JoinOps) -> Result<LocalTable> {
        let other = Self::view(other)?;
        let newheading = self.heading.intersect(other.heading())?;
        if self.heading == *other.heading() && self.heading == newheading {
            match ops {
                JoinOps::UNION => return self.union_fast(&other),
                JoinOps::MINUS => return self.minus_fast(&other),
                JoinOps::RMINUS => return other.minus_fast(self),
                _ => {}
            }
        }
        if ops == JoinOps::RMINUS {
            other.generalized_set(self, &newheading, JoinOps::MINUS)
        } else {
            self.generalized_set(&other, &newheading, ops)
        }
    }

    // ========================================================
    // Comparisons
    // ========================================================

    fn check_same_heading(&self, other: &dyn Relation) -> Result<()> {
        if self.heading != *other.heading() {
            return Err(Error::HeadingMismatch);
        }
        Ok(())
    }

    fn equal_impl(&self, other: &dyn Relation) -> Result<bool> {
        self.check_same_heading(other)?;
        if let Some(local) = other.as_local() {
            if local.cardinality() != self.cardinality() {
                return Ok(false);
            }
        }
        let mut matched = 0;
        for row in other.rows() {
            if self.contains(&row) {
                matched += 1;
                if matched > self.cardinality() {
                    break;
                }
            } else {
                other.drop_rows();
                return Ok(false);
            }
        }
        Ok(matched == self.cardinality())
    }

    fn subset_impl(&self, other: &dyn Relation) -> Result<bool> {
        self.check_same_heading(other)?;
        if let Some(local) = other.as_local() {
            if local.cardinality() < self.cardinality() {
                return Ok(false);
            }
        }
        let mut matched = 0;
        for row in other.rows() {
            if self.contains(&row) {
                matched += 1;
                if matched == self.cardinality() {
                    other.drop_rows();
                    return Ok(true);
                }
            }
        }
        Ok(self.cardinality() == 0)
    }

    fn superset_impl(&self, other: &dyn Relation) -> Result<bool> {
        self.check_same_heading(other)?;
        if let Some(local) = other.as_local() {
            if local.cardinality() > self.cardinality() {
                return Ok(false);
            }
        }
        for row in other.rows() {
            if !self.contains(&row) {
                other.drop_rows();
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn separate_impl(&self, other: &dyn Relation) -> Result<bool> {
        self.check_same_heading(other)?;
        for row in other.rows() {
            if self.contains(&row) {
                other.drop_rows();
                return Ok(false);
            }
        }
        Ok(true)
    }

    // ========================================================
    // Updates
    // ========================================================

    // Three passes over a common heading: rows to insert per the SET
    // flags, rows to delete per the complement, then apply deletions and
    // insertions. Flag combinations span pure insert to full replacement.
    fn up_join_impl(&mut self, other: &dyn Relation, ops: JoinOps) -> Result<()> {
        let other = Self::view(other)?;
        self.check_same_heading(&*other)?;

        let left = ops.has(JoinOps::SETL);
        let common = ops.has(JoinOps::SETC);
        let right = ops.has(JoinOps::SETR);

        // pass 1: rows to add
        let mut additions = LocalTable::new(self.heading.clone());
        if right && left && common {
            additions = other.clone().into_owned();
        } else if right {
            for row in &other.rows {
                if !self.contains(row) {
                    additions.add_row(row)?;
                }
            }
        }

        // pass 2: deletions
        if left && common {
            // keep everything
        } else if left {
            let doomed: Vec<Row> = self
                .rows
                .iter()
                .filter(|r| other.contains(r))
                .cloned()
                .collect();
            for row in &doomed {
                self.delete_row(row)?;
            }
        } else if common {
            let doomed: Vec<Row> = self
                .rows
                .iter()
                .filter(|r| !other.contains(r))
                .cloned()
                .collect();
            for row in &doomed {
                self.delete_row(row)?;
            }
        } else {
            self.clear();
        }

        // pass 3: additions
        for row in &additions.rows {
            self.add_row(row)?;
        }
        debug!(result = %self, "up_join");
        Ok(())
    }

    // Remove every row matching the predicate; when expressions are
    // present, reinsert its transformed replacement.
    fn update_transform_impl(
        &mut self,
        pred: &CompiledExpr,
        exprs: &[CompiledExpr],
        ev: &mut Evaluator<'_>,
    ) -> Result<()> {
        let mut replacements = LocalTable::new(self.heading.clone());
        let mut ord = 0;
        while ord < self.rows.len() {
            let row = self.rows[ord].clone();
            if pred.eval_pred(ev, Some(&row))? {
                if !exprs.is_empty() {
                    replacements.add_raw(row.transform(&self.heading, exprs, ev)?);
                }
                self.delete_at(ord);
            } else {
                ord += 1;
            }
        }
        for row in &replacements.rows {
            self.add_row(row)?;
        }
        debug!(result = %self, "update_transform");
        Ok(())
    }
}

impl Relation for LocalTable {
    fn heading(&self) -> &Heading {
        &self.heading
    }

    fn cardinality(&self) -> usize {
        self.rows.len()
    }

    fn rows(&self) -> Box<dyn Iterator<Item = Row> + '_> {
        Box::new(
            self.rows
                .iter()
                .enumerate()
                .map(|(ord, row)| row.clone().with_ord(ord)),
        )
    }

    fn contains(&self, row: &Row) -> bool {
        LocalTable::contains(self, row)
    }

    fn as_local(&self) -> Option<&LocalTable> {
        Some(self)
    }

    fn lift(&self) -> Value {
        LocalTable::lift(self)
    }

    fn project(&self, exprs: &[CompiledExpr], ev: &mut Evaluator<'_>) -> Result<LocalTable> {
        self.project_impl(exprs, ev)
    }

    fn rename(&self, exprs: &[CompiledExpr]) -> Result<LocalTable> {
        self.rename_impl(exprs)
    }

    fn restrict(&self, pred: &CompiledExpr, ev: &mut Evaluator<'_>) -> Result<LocalTable> {
        self.restrict_impl(pred, ev)
    }

    fn transform(
        &self,
        heading: &Heading,
        exprs: &[CompiledExpr],
        ev: &mut Evaluator<'_>,
    ) -> Result<LocalTable> {
        self.transform_impl(heading, exprs, ev)
    }

    fn transform_aggregate(
        &self,
        heading: &Heading,
        exprs: &[CompiledExpr],
        ev: &mut Evaluator<'_>,
    ) -> Result<LocalTable> {
        self.transform_aggregate_impl(heading, exprs, ev)
    }

    fn transform_ordered(
        &self,
        heading: &Heading,
        exprs: &[CompiledExpr],
        order_exprs: &[CompiledExpr],
        ev: &mut Evaluator<'_>,
    ) -> Result<LocalTable> {
        self.transform_ordered_impl(heading, exprs, order_exprs, ev)
    }

    fn recurse(&self, expr: &CompiledExpr, ev: &mut Evaluator<'_>) -> Result<LocalTable> {
        self.recurse_impl(expr, ev)
    }

    fn join(&self, other: &dyn Relation, ops: JoinOps) -> Result<LocalTable> {
        self.join_impl(other, ops)
    }

    fn antijoin(&self, other: &dyn Relation, ops: JoinOps) -> Result<LocalTable> {
        self.antijoin_impl(other, ops)
    }

    fn set_op(&self, other: &dyn Relation, ops: JoinOps) -> Result<LocalTable> {
        self.set_op_impl(other, ops)
    }

    fn equal(&self, other: &dyn Relation) -> Result<bool> {
        self.equal_impl(other)
    }

    fn subset(&self, other: &dyn Relation) -> Result<bool> {
        self.subset_impl(other)
    }

    fn superset(&self, other: &dyn Relation) -> Result<bool> {
        self.superset_impl(other)
    }

    fn separate(&self, other: &dyn Relation) -> Result<bool> {
        self.separate_impl(other)
    }

    fn up_join(&mut self, other: &dyn Relation, ops: JoinOps) -> Result<()> {
        self.up_join_impl(other, ops)
    }

    fn update_transform(
        &mut self,
        pred: &CompiledExpr,
        exprs: &[CompiledExpr],
        ev: &mut Evaluator<'_>,
    ) -> Result<()> {
        self.update_transform_impl(pred, exprs, ev)
    }
}

impl PartialEq for LocalTable {
    fn eq(&self, other: &Self) -> bool {
        self.heading == other.heading
            && self.cardinality() == other.cardinality()
            && self.rows.iter().all(|r| other.contains(r))
    }
}

impl Eq for LocalTable {}

impl fmt::Display for LocalTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}[{}]}}", self.heading, self.cardinality())
    }
}
