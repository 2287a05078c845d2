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

//! Instruction set for compiled expressions
//!
//! Programs arrive fully decoded: every operand is carried inline in its
//! [`Instr`] and every call site names a [`Builtin`] variant, so the
//! interpreter never parses bytes or resolves names at run time.

use std::fmt;
use std::sync::Arc;

use super::builtin::Builtin;
use super::expression::CompiledExpr;
use crate::core::Value;

/// One decoded instruction.
#[derive(Debug, Clone)]
pub enum Instr {
    /// Push a literal value
    LoadConst(Value),
    /// Push the current value of a catalog variable
    LoadCatalog(String),
    /// Fetch a catalog variable that must be code, execute it, push result
    LoadCatalogEval(String),
    /// Fetch a catalog variable that must be code, push it unevaluated
    LoadCatalogRaw(String),
    /// Resolve a name through the lookup-context stack, push its value
    LoadField(String),
    /// Push the running aggregate, or the seed on the first iteration
    LoadAgg(Value),
    /// Push accumulator slot `index`, or `default` when no block is active
    LoadAcc { index: usize, default: Value },
    /// Push a code value for later invocation
    LoadSegment(Arc<CompiledExpr>),
    /// Push the current top lookup context as a tuple value
    LoadLookup,
    /// Push a handle to the active accumulator block
    LoadAccBlock,
    /// Pop a tuple, push one of its named fields
    LoadComponent(String),
    /// Pop `args` values and dispatch
    Call { builtin: Builtin, args: usize },
    /// Pop a trailing run of `var` values collected into one list argument,
    /// then `fixed` leading values, and dispatch. `as_code` requires the
    /// collected values to be code.
    CallVariadic {
        builtin: Builtin,
        fixed: usize,
        var: usize,
        as_code: bool,
    },
    /// Pop the top of stack as the statement's return value
    EndOfStatement,
}

/// A decoded instruction list, immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Program {
    instrs: Vec<Instr>,
}

impl Program {
    pub fn new(instrs: Vec<Instr>) -> Program {
        Program { instrs }
    }

    /// The empty program; evaluates to no value.
    pub fn empty() -> Program {
        Program::default()
    }

    pub fn instructions(&self) -> &[Instr] {
        &self.instrs
    }

    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code[{}]", self.instrs.len())
    }
}
