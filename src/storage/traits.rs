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

//! The abstract relation contract
//!
//! Every relational operator is expressed against this trait so a second
//! backend can implement the same surface by deferring to another engine.
//! Operator results are always materialized local tables; a dyadic operator
//! mixing backends materializes the non-local side first via
//! [`LocalTable::materialize`].

use super::local::LocalTable;
use crate::core::{Heading, MergeOp, Result, Row, Value};
use crate::executor::{CompiledExpr, Evaluator};

/// Join/antijoin/set operation selector. The low three bits are numerically
/// the [`MergeOp`] column policy for the output heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOps(u16);

impl JoinOps {
    pub const NUL: JoinOps = JoinOps(0);
    pub const LEFT: JoinOps = JoinOps(1);
    pub const COMMON: JoinOps = JoinOps(2);
    pub const RIGHT: JoinOps = JoinOps(4);
    pub const SETL: JoinOps = JoinOps(8);
    pub const SETC: JoinOps = JoinOps(16);
    pub const SETR: JoinOps = JoinOps(32);
    pub const ANTI: JoinOps = JoinOps(64);
    pub const SET: JoinOps = JoinOps(128);
    pub const REV: JoinOps = JoinOps(256);

    // joins
    pub const JOIN: JoinOps = JoinOps(1 | 2 | 4);
    pub const COMPOSE: JoinOps = JoinOps(1 | 4);
    pub const DIVIDE: JoinOps = JoinOps(1);
    pub const RDIVIDE: JoinOps = JoinOps(4);
    pub const SEMIJOIN: JoinOps = JoinOps(1 | 2);
    pub const RSEMIJOIN: JoinOps = JoinOps(4 | 2);

    // antijoins
    pub const ANTIJOIN: JoinOps = JoinOps(64 | 1 | 2);
    pub const ANTIJOINL: JoinOps = JoinOps(64 | 1);
    pub const RANTIJOIN: JoinOps = JoinOps(64 | 4 | 2 | 256);
    pub const RANTIJOINR: JoinOps = JoinOps(64 | 4 | 256);

    // set
    pub const UNION: JoinOps = JoinOps(128 | 2 | 8 | 16 | 32);
    pub const INTERSECT: JoinOps = JoinOps(128 | 2 | 16);
    pub const SYMDIFF: JoinOps = JoinOps(128 | 2 | 8 | 32);
    pub const MINUS: JoinOps = JoinOps(128 | 2 | 8);
    pub const RMINUS: JoinOps = JoinOps(128 | 2 | 32 | 256);

    pub const fn from_bits(bits: u16) -> JoinOps {
        JoinOps(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub fn has(self, other: JoinOps) -> bool {
        self.0 & other.0 != 0
    }

    /// The column policy for the output heading.
    pub fn merge_op(self) -> MergeOp {
        MergeOp::from_bits((self.0 & 7) as u8)
    }
}

/// The table contract every backend implements.
pub trait Relation {
    fn heading(&self) -> &Heading;

    fn cardinality(&self) -> usize;

    /// Iterate rows. Each yielded row carries its ordinal; a forward-only
    /// source yields each row once.
    fn rows(&self) -> Box<dyn Iterator<Item = Row> + '_>;

    fn contains(&self, row: &Row) -> bool;

    /// Abandon remaining rows after an early exit from iteration. A no-op
    /// for random-access backends.
    fn drop_rows(&self) {}

    /// When this backend is already local, borrow it directly.
    fn as_local(&self) -> Option<&LocalTable> {
        None
    }

    /// First value of the first row, or the column type's default.
    fn lift(&self) -> Value;

    // monadic

    fn project(&self, exprs: &[CompiledExpr], ev: &mut Evaluator<'_>) -> Result<LocalTable>;

    fn rename(&self, exprs: &[CompiledExpr]) -> Result<LocalTable>;

    fn restrict(&self, pred: &CompiledExpr, ev: &mut Evaluator<'_>) -> Result<LocalTable>;

    fn transform(
        &self,
        heading: &Heading,
        exprs: &[CompiledExpr],
        ev: &mut Evaluator<'_>,
    ) -> Result<LocalTable>;

    fn transform_aggregate(
        &self,
        heading: &Heading,
        exprs: &[CompiledExpr],
        ev: &mut Evaluator<'_>,
    ) -> Result<LocalTable>;

    fn transform_ordered(
        &self,
        heading: &Heading,
        exprs: &[CompiledExpr],
        order_exprs: &[CompiledExpr],
        ev: &mut Evaluator<'_>,
    ) -> Result<LocalTable>;

    /// One expansion pass: every row present at entry (and every row the
    /// expansion discovers) is evaluated once; callers wanting a fixpoint
    /// call again until the cardinality stops growing.
    fn recurse(&self, expr: &CompiledExpr, ev: &mut Evaluator<'_>) -> Result<LocalTable>;

    // dyadic

    fn join(&self, other: &dyn Relation, ops: JoinOps) -> Result<LocalTable>;

    fn antijoin(&self, other: &dyn Relation, ops: JoinOps) -> Result<LocalTable>;

    fn set_op(&self, other: &dyn Relation, ops: JoinOps) -> Result<LocalTable>;

    // comparisons

    fn equal(&self, other: &dyn Relation) -> Result<bool>;

    fn subset(&self, other: &dyn Relation) -> Result<bool>;

    fn superset(&self, other: &dyn Relation) -> Result<bool>;

    fn separate(&self, other: &dyn Relation) -> Result<bool>;

    // updates, mutating the receiver

    fn up_join(&mut self, other: &dyn Relation, ops: JoinOps) -> Result<()>;

    fn update_transform(
        &mut self,
        pred: &CompiledExpr,
        exprs: &[CompiledExpr],
        ev: &mut Evaluator<'_>,
    ) -> Result<()>;
}
