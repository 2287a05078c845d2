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

//! The bytecode interpreter
//!
//! A single-threaded stack machine. Each `exec` call runs one program with
//! its own value stack; the lookup-context stack is shared across the
//! recursive re-entries a call chain makes (`Invoke`, `If`, `DoBlock`),
//! with every push released on every exit path including errors.
//!
//! Field references resolve through the lookup stack top-down, first match
//! wins. The aggregate seed and accumulator block are per-invocation state
//! and do not leak into nested programs.

use tracing::trace;

use super::opcode::{Instr, Program};
use crate::catalog::Catalog;
use crate::core::{AccBlockRef, Error, Result, Row, Value};

/// Stack machine bound to a catalog for the life of one query.
pub struct Evaluator<'a> {
    catalog: &'a dyn Catalog,
    lookups: Vec<Row>,
}

impl<'a> Evaluator<'a> {
    pub fn new(catalog: &'a dyn Catalog) -> Evaluator<'a> {
        Evaluator {
            catalog,
            lookups: Vec::new(),
        }
    }

    /// Depth of the lookup-context stack, for balance checks.
    pub fn lookup_depth(&self) -> usize {
        self.lookups.len()
    }

    /// Run a program. The lookup, aggregate seed, and accumulator block
    /// apply to this invocation only.
    pub fn exec(
        &mut self,
        program: &Program,
        lookup: Option<&Row>,
        aggregate: Option<Value>,
        accblock: Option<&AccBlockRef>,
    ) -> Result<Value> {
        trace!(len = program.len(), depth = self.lookups.len(), "exec");
        if program.is_empty() {
            return Ok(Value::None);
        }
        match lookup {
            Some(row) => self.with_lookup(row, |ev| ev.run(program, aggregate, accblock)),
            None => self.run(program, aggregate, accblock),
        }
    }

    /// Resolve a name through the context stack, optionally with one extra
    /// context pushed for the duration. Serves project/rename evaluation.
    pub fn lookup_name(&mut self, name: &str, lookup: Option<&Row>) -> Result<Value> {
        match lookup {
            Some(row) => self.with_lookup(row, |ev| ev.lookup_field(name)),
            None => self.lookup_field(name),
        }
    }

    /// Push a context, run the closure, pop. The pop happens after the
    /// result is captured, so errors cannot leave the stack unbalanced.
    pub(crate) fn with_lookup<T>(
        &mut self,
        row: &Row,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.lookups.push(row.clone());
        let result = f(self);
        self.lookups.pop();
        result
    }

    fn lookup_field(&self, name: &str) -> Result<Value> {
        for row in self.lookups.iter().rev() {
            if let Some(value) = row.get(name) {
                return Ok(value.clone());
            }
        }
        Err(Error::FieldNotFound(name.to_string()))
    }

    fn fetch_catalog(&self, name: &str) -> Result<Value> {
        self.catalog
            .get(name)
            .ok_or_else(|| Error::CatalogUnknown(name.to_string()))
    }

    fn run(
        &mut self,
        program: &Program,
        aggregate: Option<Value>,
        accblock: Option<&AccBlockRef>,
    ) -> Result<Value> {
        let mut stack: Vec<Value> = Vec::new();
        let mut retval: Option<Value> = None;
        for instr in program.instructions() {
            match instr {
                Instr::LoadConst(value) => stack.push(value.clone()),
                Instr::LoadCatalog(name) => stack.push(self.fetch_catalog(name)?),
                Instr::LoadCatalogEval(name) => {
                    let fetched = self.fetch_catalog(name)?;
                    match fetched {
                        Value::Code(expr) => {
                            stack.push(self.exec(expr.program(), None, None, None)?)
                        }
                        other => return Err(Error::NotCode(format!("{name}: {other}"))),
                    }
                }
                Instr::LoadCatalogRaw(name) => {
                    let fetched = self.fetch_catalog(name)?;
                    match fetched {
                        Value::Code(_) => stack.push(fetched),
                        other => return Err(Error::NotCode(format!("{name}: {other}"))),
                    }
                }
                Instr::LoadField(name) => stack.push(self.lookup_field(name)?),
                Instr::LoadAgg(seed) => {
                    stack.push(aggregate.clone().unwrap_or_else(|| seed.clone()))
                }
                Instr::LoadAcc { index, default } => {
                    let value = match accblock {
                        Some(block) => block.borrow().get(*index, default.clone()),
                        None => default.clone(),
                    };
                    stack.push(value);
                }
                Instr::LoadSegment(expr) => stack.push(Value::Code(expr.clone())),
                Instr::LoadLookup => {
                    let top = self.lookups.last().ok_or(Error::MissingLookup)?;
                    stack.push(Value::Tuple(top.clone()));
                }
                Instr::LoadAccBlock => {
                    let value = match accblock {
                        Some(block) => Value::AccBlock(block.clone()),
                        None => Value::None,
                    };
                    stack.push(value);
                }
                Instr::LoadComponent(name) => {
                    let popped = stack.pop().ok_or(Error::EmptyStack)?;
                    match popped {
                        Value::Tuple(row) => {
                            let value = row
                                .get(name)
                                .cloned()
                                .ok_or_else(|| Error::ComponentNotFound(name.clone()))?;
                            stack.push(value);
                        }
                        other => {
                            return Err(Error::InvalidOperand {
                                builtin: "LoadComponent",
                                got: other.data_type(),
                            })
                        }
                    }
                }
                Instr::Call { builtin, args } => {
                    let fixed = pop_n(&mut stack, *args)?;
                    stack.push(builtin.dispatch(self, fixed, Vec::new())?);
                }
                Instr::CallVariadic {
                    builtin,
                    fixed,
                    var,
                    as_code,
                } => {
                    let varargs = pop_n(&mut stack, *var)?;
                    if *as_code {
                        if let Some(bad) = varargs.iter().find(|v| !matches!(v, Value::Code(_))) {
                            return Err(Error::InvalidOperand {
                                builtin: builtin.name(),
                                got: bad.data_type(),
                            });
                        }
                    }
                    let fixed = pop_n(&mut stack, *fixed)?;
                    stack.push(builtin.dispatch(self, fixed, varargs)?);
                }
                Instr::EndOfStatement => {
                    retval = Some(stack.pop().ok_or(Error::EmptyStack)?);
                }
            }
        }
        match retval {
            Some(value) => Ok(value),
            None => stack.pop().ok_or(Error::EmptyStack),
        }
    }
}

// Pop `n` values preserving push order.
fn pop_n(stack: &mut Vec<Value>, n: usize) -> Result<Vec<Value>> {
    if stack.len() < n {
        return Err(Error::EmptyStack);
    }
    Ok(stack.split_off(stack.len() - n))
}
