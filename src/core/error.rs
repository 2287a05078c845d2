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

//! Error types
//!
//! Invariant violations (schema/degree/type mismatches, unresolved lookups,
//! missing accumulator context) indicate inconsistent bytecode or heading
//! bookkeeping and abort the current evaluation. User-visible runtime errors
//! go through the graded [`raise`] scheme: warnings are logged and ignored,
//! errors and fatals may be intercepted by the single optional global
//! handler, panics never are. Nothing in this crate catches and retries;
//! every failure unwinds synchronously to the caller.

use std::fmt;
use std::sync::OnceLock;

use parking_lot::RwLock;
use thiserror::Error;

use super::types::DataType;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the relational engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // =========================================================================
    // Schema errors
    // =========================================================================
    /// Duplicate column name while building a heading
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    /// Column not found in a heading
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    /// Headings expected to match do not
    #[error("headings do not match")]
    HeadingMismatch,

    /// Value count disagrees with heading degree
    #[error("wrong degree, expected {expected}, got {got}")]
    DegreeMismatch { expected: usize, got: usize },

    // =========================================================================
    // Evaluation errors
    // =========================================================================
    /// Field reference unresolved through the lookup-context chain
    #[error("field '{0}' not found in any lookup context")]
    FieldNotFound(String),

    /// Named member missing from a structured value
    #[error("component '{0}' not found")]
    ComponentNotFound(String),

    /// Expression result type disagrees with its declared type
    #[error("type mismatch, expected {expected}, got {got}")]
    TypeMismatch { expected: DataType, got: DataType },

    /// Operand popped from the stack has the wrong type
    #[error("invalid operand for {builtin}: {got}")]
    InvalidOperand {
        builtin: &'static str,
        got: DataType,
    },

    /// Wrong number of arguments bound to a function call
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Named variable unknown to the catalog
    #[error("catalog name '{0}' not found")]
    CatalogUnknown(String),

    /// A value expected to be an unevaluated program is not
    #[error("'{0}' is not code")]
    NotCode(String),

    /// Instruction needs an accumulator block but none is active
    #[error("no accumulator block active")]
    MissingAccumulator,

    /// Accumulator slot index outside the block
    #[error("accumulator index {index} out of range {len}")]
    AccumulatorRange { index: usize, len: usize },

    /// Instruction needs a lookup context but the stack is empty
    #[error("no lookup context active")]
    MissingLookup,

    /// Evaluation stack underflow; the program is malformed
    #[error("evaluation stack is empty")]
    EmptyStack,

    /// Division by zero
    #[error("divide by zero")]
    DivideByZero,

    // =========================================================================
    // Window errors
    // =========================================================================
    /// Window function used outside an ordered transform
    #[error("no ordered index attached to row")]
    MissingWindow,

    /// Row not tagged with its table ordinal
    #[error("row has no table ordinal")]
    RowNotIndexed,

    // =========================================================================
    // User-visible runtime errors
    // =========================================================================
    /// Graded runtime error raised through [`raise`]
    #[error("program error ({severity}) {source_name}: {message}")]
    Program {
        severity: Severity,
        source_name: String,
        message: String,
    },
}

/// Severity grades for user-visible runtime errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Never fatal; logged and ignored
    Warn,
    /// Fatal unless the installed handler opts to continue
    Error,
    /// Fatal unless the installed handler opts to continue
    Fatal,
    /// Always fatal; the handler is never consulted
    Panic,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
            Severity::Panic => "panic",
        };
        f.write_str(name)
    }
}

/// Handler invoked for non-panic errors; returning true continues execution.
pub type ErrorHandler = Box<dyn Fn(&str, &str) -> bool + Send + Sync>;

fn handler_slot() -> &'static RwLock<Option<ErrorHandler>> {
    static SLOT: OnceLock<RwLock<Option<ErrorHandler>>> = OnceLock::new();
    SLOT.get_or_init(|| RwLock::new(None))
}

/// Install the single global error handler, replacing any previous one.
pub fn set_error_handler(handler: Option<ErrorHandler>) {
    *handler_slot().write() = handler;
}

/// Raise a graded runtime error. Warnings always return `Ok`; errors and
/// fatals return `Ok` only when an installed handler accepts them; panics
/// are always returned as errors.
///
/// The graded scheme is the reporting surface for layers above this core
/// (interpreters, hosts). The algebra and evaluator report hard conditions
/// as `Error` values directly and never consult the handler.
pub fn raise(severity: Severity, source: &str, message: impl Into<String>) -> Result<()> {
    let message = message.into();
    if severity == Severity::Warn {
        tracing::warn!(source, "{message}");
        return Ok(());
    }
    if severity != Severity::Panic {
        if let Some(handler) = handler_slot().read().as_ref() {
            if handler(source, &message) {
                return Ok(());
            }
        }
    }
    Err(Error::Program {
        severity,
        source_name: source.to_string(),
        message,
    })
}
