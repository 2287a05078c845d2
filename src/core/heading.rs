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

//! Headings: order-independent column sets
//!
//! A heading describes the shape of a row or relation. Two headings are
//! equal whenever they hold the same columns, regardless of the order those
//! columns were declared in, and equal headings always hash alike.
//!
//! Headings come in two modes. Plain headings keep declaration order and are
//! used for argument/lookup lists. Tuple headings are normalized to a
//! canonical column order and structurally interned: requesting a tuple
//! heading for the same column set twice returns the identical `Arc`, which
//! is what gives generated row and relation types a stable identity.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHasher};

use super::column::Column;
use super::error::{Error, Result};
use crate::executor::CompiledExpr;

/// Column-combination policy for [`Heading::merge`]. The bits line up with
/// the low bits of `JoinOps` so a join operation selects its output heading
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOp(u8);

impl MergeOp {
    pub const NUL: MergeOp = MergeOp(0);
    /// Keep columns found only on the left
    pub const LEFT: MergeOp = MergeOp(1);
    /// Keep columns common to both sides
    pub const MATCH: MergeOp = MergeOp(2);
    /// Keep columns found only on the right
    pub const RIGHT: MergeOp = MergeOp(4);
    pub const UNION: MergeOp = MergeOp(7);
    pub const NOT_MATCH: MergeOp = MergeOp(5);
    pub const USE_ALL_LEFT: MergeOp = MergeOp(3);
    pub const USE_ALL_RIGHT: MergeOp = MergeOp(6);

    pub const fn from_bits(bits: u8) -> MergeOp {
        MergeOp(bits & 7)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn has(self, other: MergeOp) -> bool {
        self.0 & other.0 != 0
    }
}

#[derive(Debug)]
struct HeadingInner {
    columns: Vec<Column>,
    by_name: FxHashMap<String, usize>,
    is_tuple: bool,
    hash: u64,
}

/// A deduplicated, name-indexed set of columns. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Heading {
    inner: Arc<HeadingInner>,
}

fn tuple_cache() -> &'static Mutex<FxHashMap<Vec<Column>, Heading>> {
    static CACHE: OnceLock<Mutex<FxHashMap<Vec<Column>, Heading>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(FxHashMap::default()))
}

fn column_hash(column: &Column) -> u64 {
    let mut hasher = FxHasher::default();
    column.hash(&mut hasher);
    hasher.finish()
}

impl Default for Heading {
    fn default() -> Heading {
        Heading::empty()
    }
}

impl Heading {
    fn build(columns: Vec<Column>, is_tuple: bool) -> Result<Heading> {
        let mut by_name = FxHashMap::default();
        for (i, col) in columns.iter().enumerate() {
            if by_name.insert(col.name().to_string(), i).is_some() {
                return Err(Error::DuplicateColumn(col.name().to_string()));
            }
        }
        // XOR of per-column hashes keeps the hash independent of order
        let hash = columns
            .iter()
            .fold(columns.len() as u64, |h, c| h ^ column_hash(c));
        Ok(Heading {
            inner: Arc::new(HeadingInner {
                columns,
                by_name,
                is_tuple,
                hash,
            }),
        })
    }

    /// A plain heading preserving declaration order (argument/lookup lists).
    pub fn new(columns: Vec<Column>) -> Result<Heading> {
        Self::build(columns, false)
    }

    /// A tuple heading: canonical column order, structurally interned.
    /// Two calls with the same column set return the identical heading.
    pub fn tuple(mut columns: Vec<Column>) -> Result<Heading> {
        columns.sort_by(|a, b| a.name().cmp(b.name()));
        let mut cache = tuple_cache().lock();
        if let Some(found) = cache.get(&columns) {
            return Ok(found.clone());
        }
        let heading = Self::build(columns.clone(), true)?;
        cache.insert(columns, heading.clone());
        Ok(heading)
    }

    /// The shared empty tuple heading.
    pub fn empty() -> Heading {
        static EMPTY: OnceLock<Heading> = OnceLock::new();
        EMPTY
            .get_or_init(|| {
                Heading::tuple(Vec::new()).unwrap_or_else(|_| unreachable!("empty heading"))
            })
            .clone()
    }

    /// Tuple heading taken from expression names and declared types.
    pub fn from_exprs(exprs: &[CompiledExpr]) -> Result<Heading> {
        Heading::tuple(exprs.iter().map(|e| e.to_column()).collect())
    }

    pub fn degree(&self) -> usize {
        self.inner.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.inner.columns
    }

    pub fn is_tuple(&self) -> bool {
        self.inner.is_tuple
    }

    /// Order-independent content hash (also used by relation values).
    pub fn content_hash(&self) -> u64 {
        self.inner.hash
    }

    /// Index of the column with this name.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.inner.by_name.get(name).copied()
    }

    /// Index of a column matching by name and type.
    pub fn find_column(&self, column: &Column) -> Option<usize> {
        self.find(column.name())
            .filter(|&i| self.inner.columns[i] == *column)
    }

    pub fn contains(&self, column: &Column) -> bool {
        self.find_column(column).is_some()
    }

    /// Subset test: every column of `other` appears here.
    pub fn contains_all(&self, other: &Heading) -> bool {
        other.columns().iter().all(|c| self.contains(c))
    }

    /// For each of this heading's columns, the matching index in `other`
    /// (or `None` when absent). Drives projections and merges.
    pub fn make_index(&self, other: &Heading) -> Vec<Option<usize>> {
        self.columns()
            .iter()
            .map(|c| other.find_column(c))
            .collect()
    }

    /// Set-style column combination selected by a [`MergeOp`].
    pub fn merge(op: MergeOp, left: &Heading, right: &Heading) -> Result<Heading> {
        let columns = match op {
            MergeOp::USE_ALL_LEFT => left.columns().to_vec(),
            MergeOp::USE_ALL_RIGHT => right.columns().to_vec(),
            _ => {
                let mut cols: Vec<Column> = left
                    .columns()
                    .iter()
                    .filter(|c| {
                        if right.contains(c) {
                            op.has(MergeOp::MATCH)
                        } else {
                            op.has(MergeOp::LEFT)
                        }
                    })
                    .cloned()
                    .collect();
                cols.extend(
                    right
                        .columns()
                        .iter()
                        .filter(|c| !left.contains(c) && op.has(MergeOp::RIGHT))
                        .cloned(),
                );
                cols
            }
        };
        Heading::tuple(columns)
    }

    pub fn union(&self, other: &Heading) -> Result<Heading> {
        Heading::merge(MergeOp::UNION, self, other)
    }

    pub fn intersect(&self, other: &Heading) -> Result<Heading> {
        Heading::merge(MergeOp::MATCH, self, other)
    }

    pub fn minus(&self, other: &Heading) -> Result<Heading> {
        Heading::merge(MergeOp::LEFT, self, other)
    }

    /// Rebuild with rename expressions applied, preserving this heading's
    /// column order (the result is a plain heading; callers canonicalize).
    pub fn rename(&self, exprs: &[CompiledExpr]) -> Result<Heading> {
        let columns = self
            .columns()
            .iter()
            .map(|c| {
                match exprs
                    .iter()
                    .find(|e| e.old_name() == Some(c.name()) && e.is_renaming())
                {
                    Some(e) => c.rename(e.name()),
                    None => c.clone(),
                }
            })
            .collect();
        Heading::new(columns)
    }
}

impl PartialEq for Heading {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        self.inner.hash == other.inner.hash
            && self.degree() == other.degree()
            && self.contains_all(other)
    }
}

impl Eq for Heading {}

impl Hash for Heading {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.inner.hash);
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, col) in self.columns().iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{col}")?;
        }
        write!(f, "}}")
    }
}
