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

//! Expression execution: instruction set, builtins, and the interpreter

pub mod builtin;
pub mod evaluator;
pub mod expression;
pub mod opcode;

pub use builtin::Builtin;
pub use evaluator::Evaluator;
pub use expression::{CompiledExpr, ExprKind};
pub use opcode::{Instr, Program};
