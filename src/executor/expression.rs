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

//! Compiled expressions
//!
//! A compiled expression is the unit the front end hands the runtime: a
//! name, a kind selecting the evaluation contract, a decoded program, the
//! declared return type, and bookkeeping (rename source, argument heading,
//! accumulator count, serial). Immutable once built.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use super::evaluator::Evaluator;
use super::opcode::Program;
use crate::core::{AccBlockRef, Column, DataType, Error, Heading, Result, Row, Value};

/// Evaluation contract selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprKind {
    /// Does nothing
    Nul,
    /// A named literal, no code
    Value,
    /// Copies a value through the lookup context, no code
    Project,
    /// Copies a value under a new name, no code
    Rename,
    /// Names a sorting/grouping attribute, no code
    Order,
    /// Calculation needing no lookup context
    Closed,
    /// Iterated calculation resolving fields through a lookup context
    Open,
    /// Fold step, run once per row with the running aggregate as seed
    IsFolded,
    /// Finalizer over completed accumulators; defaults until finalized
    HasFold,
}

static SERIAL: AtomicU32 = AtomicU32::new(0);

fn next_serial() -> u32 {
    SERIAL.fetch_add(1, Ordering::Relaxed) + 1
}

/// A named expression ready for evaluation.
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    name: String,
    kind: ExprKind,
    program: Program,
    return_type: DataType,
    /// Source name when this expression projects or renames
    old_name: Option<String>,
    /// Argument heading; `None` marks an argless (lazy) function
    lookup: Option<Heading>,
    accum_count: usize,
    serial: u32,
    grouped: bool,
    descending: bool,
    value: Option<Value>,
}

impl CompiledExpr {
    /// An expression with a program to run.
    pub fn coded(
        name: impl Into<String>,
        kind: ExprKind,
        program: Program,
        return_type: DataType,
        lookup: Option<Heading>,
        accum_count: usize,
    ) -> CompiledExpr {
        CompiledExpr {
            name: name.into(),
            kind,
            program,
            return_type,
            old_name: None,
            lookup,
            accum_count,
            serial: next_serial(),
            grouped: false,
            descending: false,
            value: None,
        }
    }

    /// A codeless copy/rename: a project when the names agree, a rename
    /// otherwise.
    pub fn renaming(
        name: impl Into<String>,
        old_name: impl Into<String>,
        return_type: DataType,
    ) -> CompiledExpr {
        let name = name.into();
        let old_name = old_name.into();
        let kind = if name == old_name {
            ExprKind::Project
        } else {
            ExprKind::Rename
        };
        CompiledExpr {
            name,
            kind,
            program: Program::empty(),
            return_type,
            old_name: Some(old_name),
            lookup: None,
            accum_count: 0,
            serial: next_serial(),
            grouped: false,
            descending: false,
            value: None,
        }
    }

    /// A codeless ordering attribute for sorted/grouped transforms.
    pub fn ordering(
        name: impl Into<String>,
        return_type: DataType,
        grouped: bool,
        descending: bool,
    ) -> CompiledExpr {
        CompiledExpr {
            name: name.into(),
            kind: ExprKind::Order,
            program: Program::empty(),
            return_type,
            old_name: None,
            lookup: None,
            accum_count: 0,
            serial: next_serial(),
            grouped,
            descending,
            value: None,
        }
    }

    /// A codeless named literal.
    pub fn literal(name: impl Into<String>, value: Value) -> CompiledExpr {
        CompiledExpr {
            name: name.into(),
            kind: ExprKind::Value,
            program: Program::empty(),
            return_type: value.data_type(),
            old_name: None,
            lookup: None,
            accum_count: 0,
            serial: next_serial(),
            grouped: false,
            descending: false,
            value: Some(value),
        }
    }

    /// The always-true predicate.
    pub fn always() -> CompiledExpr {
        CompiledExpr::coded("&t", ExprKind::Closed, Program::empty(), DataType::Bool, None, 0)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ExprKind {
        self.kind
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn return_type(&self) -> DataType {
        self.return_type
    }

    pub fn old_name(&self) -> Option<&str> {
        self.old_name.as_deref()
    }

    /// The argument heading, empty when argless.
    pub fn lookup_heading(&self) -> Heading {
        self.lookup.clone().unwrap_or_else(Heading::empty)
    }

    pub fn is_argless(&self) -> bool {
        self.lookup.is_none()
    }

    pub fn accum_count(&self) -> usize {
        self.accum_count
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }

    pub fn is_grouped(&self) -> bool {
        self.grouped
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }

    pub fn is_renaming(&self) -> bool {
        self.kind == ExprKind::Rename
    }

    pub fn is_order(&self) -> bool {
        self.kind == ExprKind::Order
    }

    pub fn is_folded(&self) -> bool {
        self.kind == ExprKind::IsFolded
    }

    pub fn has_fold(&self) -> bool {
        self.kind == ExprKind::HasFold
    }

    /// The column this expression contributes to a result heading.
    pub fn to_column(&self) -> Column {
        Column::new(self.name.clone(), self.return_type)
    }

    /// Evaluate with no lookup context.
    pub fn eval(&self, ev: &mut Evaluator<'_>) -> Result<Value> {
        self.eval_open(ev, None)
    }

    /// Evaluate against an optional lookup context. Literals return their
    /// value; a not-yet-finalized fold returns the type default; renames
    /// resolve the old name through the context.
    pub fn eval_open(&self, ev: &mut Evaluator<'_>, lookup: Option<&Row>) -> Result<Value> {
        match self.kind {
            ExprKind::Value => Ok(self.value.clone().unwrap_or(Value::None)),
            ExprKind::HasFold => Ok(self.return_type.default_value()),
            ExprKind::Project | ExprKind::Rename => {
                let old = self
                    .old_name
                    .as_deref()
                    .ok_or_else(|| Error::FieldNotFound(self.name.clone()))?;
                ev.lookup_name(old, lookup)
            }
            _ => {
                let ret = ev.exec(&self.program, lookup, None, None)?;
                self.check_return_type(&ret)?;
                Ok(ret)
            }
        }
    }

    /// Evaluate as a predicate; an empty program is `true`.
    pub fn eval_pred(&self, ev: &mut Evaluator<'_>, lookup: Option<&Row>) -> Result<bool> {
        if self.program.is_empty() {
            return Ok(true);
        }
        let ret = self.eval_open(ev, lookup)?;
        ret.as_bool().ok_or(Error::TypeMismatch {
            expected: DataType::Bool,
            got: ret.data_type(),
        })
    }

    /// Run one fold step with the previous running value as seed.
    pub fn eval_is_folded(
        &self,
        ev: &mut Evaluator<'_>,
        lookup: Option<&Row>,
        aggregate: Value,
    ) -> Result<Value> {
        let ret = ev.exec(&self.program, lookup, Some(aggregate), None)?;
        self.check_return_type(&ret)?;
        Ok(ret)
    }

    /// Finalize over a completed accumulator block, addressing slots from
    /// `accbase`.
    pub fn eval_has_fold(
        &self,
        ev: &mut Evaluator<'_>,
        lookup: Option<&Row>,
        accblock: &AccBlockRef,
        accbase: usize,
    ) -> Result<Value> {
        accblock.borrow_mut().set_index_base(accbase);
        let ret = ev.exec(&self.program, lookup, None, Some(accblock))?;
        self.check_return_type(&ret)?;
        Ok(ret)
    }

    // unknown and code return types are unchecked
    fn check_return_type(&self, value: &Value) -> Result<()> {
        if self.return_type == DataType::None || self.return_type == DataType::Code {
            return Ok(());
        }
        if value.data_type() != self.return_type {
            return Err(Error::TypeMismatch {
                expected: self.return_type,
                got: value.data_type(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for CompiledExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ExprKind::Value => write!(
                f,
                "{:?} {}={}",
                self.kind,
                self.name,
                self.value.as_ref().unwrap_or(&Value::None)
            ),
            ExprKind::Project | ExprKind::Rename => write!(
                f,
                "{:?} {}<-{}",
                self.kind,
                self.name,
                self.old_name.as_deref().unwrap_or("?")
            ),
            ExprKind::Order => write!(
                f,
                "{:?} {} {} {}",
                self.kind,
                self.name,
                if self.grouped { "grp" } else { "ord" },
                if self.descending { "desc" } else { "asc" }
            ),
            _ => write!(
                f,
                "{:?} {}:{} ac:{} {} #{}",
                self.kind, self.name, self.return_type, self.accum_count, self.program, self.serial
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serials_are_unique() {
        let a = CompiledExpr::literal("a", Value::Number(1.0));
        let b = CompiledExpr::literal("b", Value::Number(2.0));
        assert_ne!(a.serial(), b.serial());
    }

    #[test]
    fn renaming_kind_from_names() {
        let p = CompiledExpr::renaming("x", "x", DataType::Number);
        assert_eq!(p.kind(), ExprKind::Project);
        let r = CompiledExpr::renaming("y", "x", DataType::Number);
        assert_eq!(r.kind(), ExprKind::Rename);
        assert!(r.is_renaming());
        assert_eq!(r.old_name(), Some("x"));
    }
}
