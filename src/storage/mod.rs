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

//! Relations: the abstract contract, the local table, and the sort index

pub mod local;
pub mod ordered_index;
pub mod traits;

pub use local::LocalTable;
pub use ordered_index::{OffsetMode, OrderedIndex, Segment};
pub use traits::{JoinOps, Relation};
