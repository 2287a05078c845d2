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

//! Core data model: types, values, headings, rows, accumulators, errors

pub mod accumulator;
pub mod column;
pub mod error;
pub mod heading;
pub mod row;
pub mod types;
pub mod value;

pub use accumulator::{AccBlockRef, AccumulatorBlock};
pub use column::Column;
pub use error::{raise, set_error_handler, Error, Result, Severity};
pub use heading::{Heading, MergeOp};
pub use row::{Row, WindowCtx};
pub use types::DataType;
pub use value::Value;
