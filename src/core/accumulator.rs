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

//! Accumulator storage for fold expressions
//!
//! One block holds the running values for every fold in a transform pass.
//! Each fold owns one slot, addressed as `index_base + local index`; by
//! advancing the base between expressions, folds in different expressions
//! of the same pass never collide even though each expression numbers its
//! own folds from zero.

use std::cell::RefCell;
use std::rc::Rc;

use super::error::{Error, Result};
use super::value::Value;

/// Shared handle to an accumulator block. Transform passes clone the handle
/// into each fold evaluation so running values survive across rows.
pub type AccBlockRef = Rc<RefCell<AccumulatorBlock>>;

/// A set of accumulator slots, lazily grown, with a movable index base.
#[derive(Debug, Default)]
pub struct AccumulatorBlock {
    index_base: usize,
    slots: Vec<Option<Value>>,
}

impl AccumulatorBlock {
    pub fn new() -> AccumulatorBlock {
        AccumulatorBlock::default()
    }

    /// A fresh block behind a shared handle.
    pub fn shared() -> AccBlockRef {
        Rc::new(RefCell::new(AccumulatorBlock::new()))
    }

    pub fn index_base(&self) -> usize {
        self.index_base
    }

    /// Move the base so subsequent local indexes land in fresh slots.
    pub fn set_index_base(&mut self, base: usize) {
        self.index_base = base;
    }

    /// Current value of slot `index` (local to the base), or `default` if
    /// the slot has never been set.
    pub fn get(&self, index: usize, default: Value) -> Value {
        match self.slots.get(self.index_base + index) {
            Some(Some(value)) => value.clone(),
            _ => default,
        }
    }

    /// Store the running value for slot `index` (local to the base).
    pub fn set(&mut self, index: usize, value: Value) -> Result<()> {
        let at = self
            .index_base
            .checked_add(index)
            .ok_or(Error::AccumulatorRange {
                index,
                len: self.slots.len(),
            })?;
        if at >= self.slots.len() {
            self.slots.resize(at + 1, None);
        }
        self.slots[at] = Some(value);
        Ok(())
    }

    /// Raw slot storage in allocation order. Unset slots stay `None`,
    /// distinct from slots holding a default value.
    pub fn slots(&self) -> &[Option<Value>] {
        &self.slots
    }

    /// Number of slots allocated so far.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_slot_yields_default() {
        let block = AccumulatorBlock::new();
        assert_eq!(block.get(0, Value::Number(0.0)), Value::Number(0.0));
    }

    #[test]
    fn set_then_get() {
        let mut block = AccumulatorBlock::new();
        block.set(2, Value::Number(7.0)).unwrap();
        assert_eq!(block.get(2, Value::Number(0.0)), Value::Number(7.0));
        // neighbours untouched
        assert_eq!(block.get(1, Value::Number(0.0)), Value::Number(0.0));
    }

    #[test]
    fn slots_keep_unset_entries_distinct_from_defaults() {
        let mut block = AccumulatorBlock::new();
        block.set(1, Value::Number(0.0)).unwrap();
        assert_eq!(block.slots(), &[None, Some(Value::Number(0.0))]);
    }

    #[test]
    fn index_base_isolates_expressions() {
        let mut block = AccumulatorBlock::new();
        block.set(0, Value::Number(1.0)).unwrap();
        block.set_index_base(1);
        // same local index, different slot
        assert_eq!(block.get(0, Value::Number(0.0)), Value::Number(0.0));
        block.set(0, Value::Number(2.0)).unwrap();
        block.set_index_base(0);
        assert_eq!(block.get(0, Value::Number(0.0)), Value::Number(1.0));
    }
}
