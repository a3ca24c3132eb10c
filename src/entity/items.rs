//! Ordered attribute map.

use crate::value::Value;

/// Name to value map that keeps insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemMap {
    entries: Vec<(String, Value)>,
}

impl ItemMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value stored under exactly `name`
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    /// Replace the value under `name`, or append a new entry
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn as_slice(&self) -> &[(String, Value)] {
        &self.entries
    }

    pub fn to_vec(&self) -> Vec<(String, Value)> {
        self.entries.clone()
    }
}

impl FromIterator<(String, Value)> for ItemMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut map = ItemMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order_and_replaces() {
        let mut map = ItemMap::new();
        map.insert("b", Value::Int32(1));
        map.insert("a", Value::Int32(2));
        map.insert("b", Value::Int32(3));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(map.get("b"), Some(&Value::Int32(3)));
        assert_eq!(map.remove("b"), Some(Value::Int32(3)));
        assert_eq!(map.len(), 1);
    }
}
