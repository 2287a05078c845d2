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

//! Sort index over ordering and grouping columns
//!
//! Keys are the segment values of a row plus its table ordinal as the final
//! tie-break, so the order is total and deterministic. A group break occurs
//! wherever any grouped segment's value differs between two keys; grouped
//! segments precede ordering segments, so groups are contiguous runs.

use std::cmp::Ordering;

use smallvec::SmallVec;

use crate::core::{DataType, Error, Heading, Result, Row, Value};
use crate::executor::CompiledExpr;

/// How a window offset is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetMode {
    /// Forward from the current row
    Lead,
    /// Backward from the current row
    Lag,
    /// Forward from the first row of the current group
    Absolute,
}

/// One ordering column of the index.
#[derive(Debug, Clone)]
pub struct Segment {
    pub data_type: DataType,
    pub descending: bool,
    pub grouped: bool,
    /// Position in the owning table's heading
    pub column: usize,
}

type KeyValues = SmallVec<[Value; 4]>;

#[derive(Debug, Clone)]
struct SortKey {
    values: KeyValues,
    ord: usize,
}

/// Ordered view of a table, mapping sorted positions back to row ordinals.
#[derive(Debug)]
pub struct OrderedIndex {
    segments: Vec<Segment>,
    keys: Vec<SortKey>,
}

impl OrderedIndex {
    /// Build an empty index from ordering expressions resolved against the
    /// owning heading.
    pub fn new(exprs: &[CompiledExpr], heading: &Heading) -> Result<OrderedIndex> {
        let segments = exprs
            .iter()
            .map(|e| {
                let column = heading
                    .find_column(&e.to_column())
                    .ok_or_else(|| Error::ColumnNotFound(e.name().to_string()))?;
                Ok(Segment {
                    data_type: e.return_type(),
                    descending: e.is_descending(),
                    grouped: e.is_grouped(),
                    column,
                })
            })
            .collect::<Result<Vec<Segment>>>()?;
        Ok(OrderedIndex {
            segments,
            keys: Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn build_key(&self, row: &Row, ord: usize) -> SortKey {
        SortKey {
            values: self
                .segments
                .iter()
                .map(|s| row.values()[s.column].clone())
                .collect(),
            ord,
        }
    }

    fn compare(&self, a: &SortKey, b: &SortKey) -> Ordering {
        for (segment, (x, y)) in self.segments.iter().zip(a.values.iter().zip(&b.values)) {
            let ord = x.compare(y);
            if ord != Ordering::Equal {
                return if segment.descending { ord.reverse() } else { ord };
            }
        }
        a.ord.cmp(&b.ord)
    }

    // any grouped segment differing means a new group
    fn is_key_break(&self, a: &SortKey, b: &SortKey) -> bool {
        self.segments
            .iter()
            .enumerate()
            .any(|(i, s)| s.grouped && a.values[i] != b.values[i])
    }

    /// Add a row under its table ordinal.
    pub fn insert(&mut self, row: &Row, ord: usize) {
        let key = self.build_key(row, ord);
        let pos = self
            .keys
            .partition_point(|k| self.compare(k, &key) == Ordering::Less);
        self.keys.insert(pos, key);
    }

    /// Row ordinals in sort order, each flagged when it starts a new group.
    pub fn ordinals(&self) -> impl Iterator<Item = (usize, bool)> + '_ {
        self.keys.iter().enumerate().map(|(i, key)| {
            let is_break = i == 0 || self.is_key_break(&self.keys[i - 1], key);
            (key.ord, is_break)
        })
    }

    fn position(&self, row: &Row) -> Result<usize> {
        let ord = row.ord().ok_or(Error::RowNotIndexed)?;
        let key = self.build_key(row, ord);
        self.keys
            .binary_search_by(|k| self.compare(k, &key))
            .map_err(|_| Error::RowNotIndexed)
    }

    fn group_start(&self, mut pos: usize) -> usize {
        while pos > 0 && !self.is_key_break(&self.keys[pos - 1], &self.keys[pos]) {
            pos -= 1;
        }
        pos
    }

    /// Ordinal of the row `index` steps away per `mode`, or `None` when the
    /// target falls outside the current group.
    pub fn offset(&self, row: &Row, index: usize, mode: OffsetMode) -> Result<Option<usize>> {
        let pos = self.position(row)?;
        let start = self.group_start(pos);
        let target = match mode {
            OffsetMode::Lead => pos.checked_add(index),
            OffsetMode::Lag => pos.checked_sub(index),
            OffsetMode::Absolute => start.checked_add(index),
        };
        let target = match target {
            Some(t) if t >= start && t < self.keys.len() => t,
            _ => return Ok(None),
        };
        if self.is_key_break(&self.keys[pos], &self.keys[target]) {
            return Ok(None);
        }
        Ok(Some(self.keys[target].ord))
    }

    /// Offset of the row from the start of its group.
    pub fn ordinal_in_group(&self, row: &Row) -> Result<usize> {
        let pos = self.position(row)?;
        Ok(pos - self.group_start(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Column;

    fn heading() -> Heading {
        Heading::new(vec![
            Column::new("g", DataType::Text),
            Column::new("n", DataType::Number),
        ])
        .unwrap()
    }

    fn row(h: &Heading, g: &str, n: f64, ord: usize) -> Row {
        Row::new(h.clone(), vec![Value::text(g), Value::Number(n)])
            .unwrap()
            .with_ord(ord)
    }

    fn grouped_index(h: &Heading, rows: &[Row]) -> OrderedIndex {
        let exprs = vec![
            CompiledExpr::ordering("g", DataType::Text, true, false),
            CompiledExpr::ordering("n", DataType::Number, false, false),
        ];
        let mut index = OrderedIndex::new(&exprs, h).unwrap();
        for (ord, r) in rows.iter().enumerate() {
            index.insert(r, ord);
        }
        index
    }

    #[test]
    fn ordinals_report_group_breaks() {
        let h = heading();
        let rows = vec![
            row(&h, "b", 1.0, 0),
            row(&h, "a", 2.0, 1),
            row(&h, "a", 1.0, 2),
        ];
        let index = grouped_index(&h, &rows);
        let out: Vec<(usize, bool)> = index.ordinals().collect();
        // sorted: (a,1)=ord2 break, (a,2)=ord1, (b,1)=ord0 break
        assert_eq!(out, vec![(2, true), (1, false), (0, true)]);
    }

    #[test]
    fn lead_off_group_end_is_none() {
        let h = heading();
        let rows = vec![
            row(&h, "a", 1.0, 0),
            row(&h, "a", 2.0, 1),
            row(&h, "b", 1.0, 2),
        ];
        let index = grouped_index(&h, &rows);
        // last row of group "a"
        assert_eq!(index.offset(&rows[1], 1, OffsetMode::Lead).unwrap(), None);
        assert_eq!(
            index.offset(&rows[0], 1, OffsetMode::Lead).unwrap(),
            Some(1)
        );
    }

    #[test]
    fn absolute_zero_is_group_first() {
        let h = heading();
        let rows = vec![
            row(&h, "a", 2.0, 0),
            row(&h, "a", 1.0, 1),
            row(&h, "b", 5.0, 2),
        ];
        let index = grouped_index(&h, &rows);
        assert_eq!(
            index.offset(&rows[0], 0, OffsetMode::Absolute).unwrap(),
            Some(1)
        );
        assert_eq!(
            index.offset(&rows[2], 0, OffsetMode::Absolute).unwrap(),
            Some(2)
        );
    }

    #[test]
    fn lag_before_group_start_is_none() {
        let h = heading();
        let rows = vec![row(&h, "a", 1.0, 0), row(&h, "b", 1.0, 1)];
        let index = grouped_index(&h, &rows);
        assert_eq!(index.offset(&rows[1], 1, OffsetMode::Lag).unwrap(), None);
    }

    #[test]
    fn descending_segment_reverses_order() {
        let h = heading();
        let exprs = vec![CompiledExpr::ordering("n", DataType::Number, false, true)];
        let mut index = OrderedIndex::new(&exprs, &h).unwrap();
        let rows = vec![row(&h, "a", 1.0, 0), row(&h, "a", 3.0, 1)];
        for (ord, r) in rows.iter().enumerate() {
            index.insert(r, ord);
        }
        let out: Vec<usize> = index.ordinals().map(|(o, _)| o).collect();
        assert_eq!(out, vec![1, 0]);
    }

    #[test]
    fn ordinal_in_group_offsets_from_group_start() {
        let h = heading();
        let rows = vec![
            row(&h, "a", 1.0, 0),
            row(&h, "a", 2.0, 1),
            row(&h, "b", 9.0, 2),
        ];
        let index = grouped_index(&h, &rows);
        assert_eq!(index.ordinal_in_group(&rows[1]).unwrap(), 1);
        assert_eq!(index.ordinal_in_group(&rows[2]).unwrap(), 0);
    }
}
