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

//! Builtin functions the instruction stream dispatches to
//!
//! A closed enum: call sites are resolved when the program is built, so
//! dispatch is a match, never a name lookup. Fold and the window builtins
//! receive their accumulator block and lookup row as explicit stack
//! arguments pushed by `LoadAccBlock`/`LoadLookup`.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::trace;

use super::evaluator::Evaluator;
use super::expression::CompiledExpr;
use crate::core::{AccBlockRef, Error, Result, Row, Value};
use crate::storage::OffsetMode;

/// The builtin operations callable from a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    // arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    // comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // logic
    And,
    Or,
    Not,
    // text
    Concat,
    // control
    If,
    DoBlock,
    Invoke,
    // aggregation
    Fold,
    CumFold,
    // relational lift
    Lift,
    Count,
    // window
    Ordinal,
    OrdinalGroup,
    ValueLead,
    ValueLag,
    ValueNth,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Add => "Add",
            Builtin::Sub => "Sub",
            Builtin::Mul => "Mul",
            Builtin::Div => "Div",
            Builtin::Mod => "Mod",
            Builtin::Neg => "Neg",
            Builtin::Eq => "Eq",
            Builtin::Ne => "Ne",
            Builtin::Lt => "Lt",
            Builtin::Le => "Le",
            Builtin::Gt => "Gt",
            Builtin::Ge => "Ge",
            Builtin::And => "And",
            Builtin::Or => "Or",
            Builtin::Not => "Not",
            Builtin::Concat => "Concat",
            Builtin::If => "If",
            Builtin::DoBlock => "DoBlock",
            Builtin::Invoke => "Invoke",
            Builtin::Fold => "Fold",
            Builtin::CumFold => "CumFold",
            Builtin::Lift => "Lift",
            Builtin::Count => "Count",
            Builtin::Ordinal => "Ordinal",
            Builtin::OrdinalGroup => "OrdinalGroup",
            Builtin::ValueLead => "ValueLead",
            Builtin::ValueLag => "ValueLag",
            Builtin::ValueNth => "ValueNth",
        }
    }

    /// Fixed argument count expected on the stack (variadic calls add their
    /// collected list on top of this).
    pub fn arity(self) -> usize {
        match self {
            Builtin::Neg | Builtin::Not | Builtin::DoBlock | Builtin::Lift | Builtin::Count => 1,
            Builtin::Ordinal | Builtin::OrdinalGroup => 1,
            Builtin::CumFold => 2,
            Builtin::If | Builtin::Invoke | Builtin::ValueLead | Builtin::ValueLag
            | Builtin::ValueNth => 3,
            Builtin::Fold => 4,
            _ => 2,
        }
    }

    /// Execute against popped arguments. `varargs` is the collected
    /// variable-arity tail, empty for fixed calls.
    pub(crate) fn dispatch(
        self,
        ev: &mut Evaluator<'_>,
        mut args: Vec<Value>,
        varargs: Vec<Value>,
    ) -> Result<Value> {
        trace!(builtin = self.name(), args = args.len(), "dispatch");
        match self {
            Builtin::Add => binary_number(self, &args, |a, b| Ok(a + b)),
            Builtin::Sub => binary_number(self, &args, |a, b| Ok(a - b)),
            Builtin::Mul => binary_number(self, &args, |a, b| Ok(a * b)),
            Builtin::Div => binary_number(self, &args, |a, b| {
                if b == 0.0 {
                    Err(Error::DivideByZero)
                } else {
                    Ok(a / b)
                }
            }),
            Builtin::Mod => binary_number(self, &args, |a, b| {
                if b == 0.0 {
                    Err(Error::DivideByZero)
                } else {
                    Ok(a % b)
                }
            }),
            Builtin::Neg => {
                let a = number(self, arg(&args, 0)?)?;
                Ok(Value::Number(-a))
            }
            Builtin::Eq => Ok(Value::Bool(arg(&args, 0)? == arg(&args, 1)?)),
            Builtin::Ne => Ok(Value::Bool(arg(&args, 0)? != arg(&args, 1)?)),
            Builtin::Lt => compare(&args, |o| o == Ordering::Less),
            Builtin::Le => compare(&args, |o| o != Ordering::Greater),
            Builtin::Gt => compare(&args, |o| o == Ordering::Greater),
            Builtin::Ge => compare(&args, |o| o != Ordering::Less),
            Builtin::And => {
                let a = boolean(self, arg(&args, 0)?)?;
                let b = boolean(self, arg(&args, 1)?)?;
                Ok(Value::Bool(a && b))
            }
            Builtin::Or => {
                let a = boolean(self, arg(&args, 0)?)?;
                let b = boolean(self, arg(&args, 1)?)?;
                Ok(Value::Bool(a || b))
            }
            Builtin::Not => {
                let a = boolean(self, arg(&args, 0)?)?;
                Ok(Value::Bool(!a))
            }
            Builtin::Concat => {
                let a = arg(&args, 0)?;
                let b = arg(&args, 1)?;
                Ok(Value::text(format!("{a}{b}")))
            }
            Builtin::If => {
                let cond = boolean(self, arg(&args, 0)?)?;
                let chosen = code(self, arg(&args, if cond { 1 } else { 2 })?)?;
                chosen.eval(ev)
            }
            Builtin::DoBlock => {
                let block = code(self, arg(&args, 0)?)?;
                ev.exec(block.program(), None, None, None)
            }
            Builtin::Invoke => invoke(ev, args, varargs),
            Builtin::Fold => {
                let block = accblock(self, arg(&args, 0)?)?;
                let index = number(self, arg(&args, 1)?)? as usize;
                let default = arg(&args, 2)?.clone();
                let expr = code(self, arg(&args, 3)?)?;
                let seed = block.borrow().get(index, default);
                let updated = expr.eval_is_folded(ev, None, seed)?;
                block.borrow_mut().set(index, updated.clone())?;
                Ok(updated)
            }
            Builtin::CumFold => {
                let expr = code(self, arg(&args, 1)?)?;
                // a None accumulator is the request for a starting value
                match args.swap_remove(0) {
                    Value::None => Ok(expr.return_type().default_value()),
                    accum => expr.eval_is_folded(ev, None, accum),
                }
            }
            Builtin::Lift => match arg(&args, 0)? {
                Value::Relation(table) => Ok(table.lift()),
                other => Err(invalid(self, other)),
            },
            Builtin::Count => match arg(&args, 0)? {
                Value::Relation(table) => Ok(Value::Number(table.cardinality() as f64)),
                other => Err(invalid(self, other)),
            },
            Builtin::Ordinal => row(self, arg(&args, 0)?)?.ordinal(false),
            Builtin::OrdinalGroup => row(self, arg(&args, 0)?)?.ordinal(true),
            Builtin::ValueLead => offset(self, ev, &args, OffsetMode::Lead),
            Builtin::ValueLag => offset(self, ev, &args, OffsetMode::Lag),
            Builtin::ValueNth => offset(self, ev, &args, OffsetMode::Absolute),
        }
    }
}

// Invoke a defined function with its arguments bound in scope. A fold
// inside the function body addresses the caller's block from accbase.
fn invoke(ev: &mut Evaluator<'_>, args: Vec<Value>, varargs: Vec<Value>) -> Result<Value> {
    let func = code(Builtin::Invoke, arg(&args, 0)?)?;
    let accbase = number(Builtin::Invoke, arg(&args, 2)?)? as usize;
    let bound = Row::untyped(func.lookup_heading(), varargs)?;
    if func.has_fold() {
        let block = accblock(Builtin::Invoke, arg(&args, 1)?)?;
        func.eval_has_fold(ev, Some(&bound), &block, accbase)
    } else {
        func.eval_open(ev, Some(&bound))
    }
}

fn offset(
    builtin: Builtin,
    ev: &mut Evaluator<'_>,
    args: &[Value],
    mode: OffsetMode,
) -> Result<Value> {
    let attr = code(builtin, arg(args, 0)?)?;
    let index = number(builtin, arg(args, 1)?)? as usize;
    let current = row(builtin, arg(args, 2)?)?;
    current.value_offset(&attr, index, mode, ev)
}

fn arg<'a>(args: &'a [Value], index: usize) -> Result<&'a Value> {
    args.get(index).ok_or(Error::EmptyStack)
}

fn invalid(builtin: Builtin, value: &Value) -> Error {
    Error::InvalidOperand {
        builtin: builtin.name(),
        got: value.data_type(),
    }
}

fn number(builtin: Builtin, value: &Value) -> Result<f64> {
    value.as_number().ok_or_else(|| invalid(builtin, value))
}

fn boolean(builtin: Builtin, value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| invalid(builtin, value))
}

fn code(builtin: Builtin, value: &Value) -> Result<Arc<CompiledExpr>> {
    match value {
        Value::Code(expr) => Ok(expr.clone()),
        other => Err(invalid(builtin, other)),
    }
}

fn row<'a>(builtin: Builtin, value: &'a Value) -> Result<&'a Row> {
    match value {
        Value::Tuple(row) => Ok(row),
        other => Err(invalid(builtin, other)),
    }
}

fn accblock(builtin: Builtin, value: &Value) -> Result<AccBlockRef> {
    match value {
        Value::AccBlock(block) => Ok(block.clone()),
        Value::None => Err(Error::MissingAccumulator),
        other => Err(invalid(builtin, other)),
    }
}

fn binary_number(
    builtin: Builtin,
    args: &[Value],
    op: impl FnOnce(f64, f64) -> Result<f64>,
) -> Result<Value> {
    let a = number(builtin, arg(args, 0)?)?;
    let b = number(builtin, arg(args, 1)?)?;
    Ok(Value::Number(op(a, b)?))
}

fn compare(args: &[Value], test: impl FnOnce(Ordering) -> bool) -> Result<Value> {
    let a = arg(args, 0)?;
    let b = arg(args, 1)?;
    if a.data_type() != b.data_type() {
        return Err(Error::TypeMismatch {
            expected: a.data_type(),
            got: b.data_type(),
        });
    }
    Ok(Value::Bool(test(a.compare(b))))
}
