use crate::{options::OperationOption, value::Value};
use sha2::{Digest, Sha256};
use ssaflow_core::InstId;
use std::collections::HashSet;
use std::fmt;

/// An ordered collection of [`Value`]s returned by traversals.
///
/// Order carries no meaning; callers compare results as sets.
#[derive(Clone, Default)]
pub struct Values(Vec<Value>);

impl Values {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn push(&mut self, value: Value) {
        self.0.push(value);
    }

    pub fn extend(&mut self, other: Values) {
        self.0.extend(other.0);
    }

    pub fn ids(&self) -> Vec<InstId> {
        self.0.iter().map(Value::id).collect()
    }

    pub fn contains_id(&self, id: InstId) -> bool {
        self.0.iter().any(|v| v.id() == id)
    }

    /// Keeps the first wrapper of every instruction.
    pub fn dedup(self) -> Self {
        let mut seen = HashSet::new();
        self.0.into_iter().filter(|v| seen.insert(v.id())).collect()
    }

    pub fn filter(&self, mut predicate: impl FnMut(&Value) -> bool) -> Self {
        self.0.iter().filter(|v| predicate(v)).cloned().collect()
    }

    pub fn for_each(&self, f: impl FnMut(&Value)) {
        self.0.iter().for_each(f);
    }

    pub fn flat_map(&self, mut f: impl FnMut(&Value) -> Values) -> Self {
        self.0.iter().flat_map(|v| f(v).0).collect()
    }

    pub fn users(&self) -> Self {
        self.flat_map(Value::users).dedup()
    }

    pub fn operands(&self) -> Self {
        self.flat_map(Value::operands).dedup()
    }

    /// Rendered instructions, sorted, for order-insensitive comparison.
    pub fn strings(&self) -> Vec<String> {
        let mut strings: Vec<String> = self.0.iter().map(Value::to_string).collect();
        strings.sort();
        strings
    }

    /// Order-insensitive fingerprint of the instructions in this collection.
    pub fn hash(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let mut ids = self.ids();
        ids.sort();
        ids.dedup();
        let mut hasher = Sha256::new();
        for id in ids {
            hasher.update(id.0.to_le_bytes());
        }
        Some(format!("{:x}", hasher.finalize()))
    }

    pub fn append_depend_on(&self, other: &Value) {
        for value in &self.0 {
            value.append_depend_on(other);
        }
    }

    pub fn append_effect_on(&self, other: &Value) {
        for value in &self.0 {
            value.append_effect_on(other);
        }
    }

    /// Top-defs of every element, each traversal independent, deduplicated.
    pub fn get_top_defs(&self, options: &[OperationOption]) -> Values {
        self.flat_map(|v| v.get_top_defs(options)).dedup()
    }

    pub fn get_bottom_uses(&self, options: &[OperationOption]) -> Values {
        self.flat_map(|v| v.get_bottom_uses(options)).dedup()
    }
}

impl From<Value> for Values {
    fn from(value: Value) -> Self {
        Self(vec![value])
    }
}

impl From<Vec<Value>> for Values {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<Value> for Values {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Values {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Values {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            writeln!(f, "{}: {}", i, value)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}
