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

//! Named-variable catalog consumed by the evaluator's load instructions

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::core::Value;

/// Store of named values the evaluator reads. Implementations use interior
/// mutability; the evaluator only ever holds a shared reference.
pub trait Catalog {
    /// The value bound to `name`, if any.
    fn get(&self, name: &str) -> Option<Value>;

    /// Bind `name` to `value`, replacing any prior binding.
    fn set(&self, name: &str, value: Value);
}

/// In-memory catalog backed by a hash map.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    entries: RwLock<FxHashMap<String, Value>>,
}

impl MemoryCatalog {
    pub fn new() -> MemoryCatalog {
        MemoryCatalog::default()
    }
}

impl Catalog for MemoryCatalog {
    fn get(&self, name: &str) -> Option<Value> {
        self.entries.read().get(name).cloned()
    }

    fn set(&self, name: &str, value: Value) {
        self.entries.write().insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get() {
        let catalog = MemoryCatalog::new();
        assert_eq!(catalog.get("x"), None);
        catalog.set("x", Value::Number(1.0));
        assert_eq!(catalog.get("x"), Some(Value::Number(1.0)));
        catalog.set("x", Value::text("later"));
        assert_eq!(catalog.get("x"), Some(Value::text("later")));
    }
}
