//! Ordered collection with a key index and deletion tracking.

use std::collections::HashMap;
use std::hash::Hash;

/// Element with a designated key field
pub trait Keyed {
    type Key: Eq + Hash + Clone + std::fmt::Debug;

    fn key(&self) -> Self::Key;
}

/// Ordered collection indexed by [`Keyed::key`].
///
/// The index maps each key to the position of its first occurrence and is
/// rebuilt on every structural change, so it always agrees with the live
/// sequence. Elements removed, replaced or cleared are appended to a
/// `deleting` shadow list.
#[derive(Debug, Clone)]
pub struct KeyedCollection<T: Keyed> {
    items: Vec<T>,
    index: HashMap<T::Key, usize>,
    deleting: Vec<T>,
}

impl<T: Keyed> Default for KeyedCollection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
            deleting: Vec::new(),
        }
    }
}

impl<T: Keyed> KeyedCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, item) in self.items.iter().enumerate() {
            self.index.entry(item.key()).or_insert(i);
        }
    }

    /// Element whose key is `key`.
    ///
    /// Keys derived from mutable state may drift after insertion; a stale
    /// index entry falls back to a scan.
    pub fn get_by(&self, key: &T::Key) -> Option<&T> {
        self.position_by(key).map(|i| &self.items[i])
    }

    pub fn position_by(&self, key: &T::Key) -> Option<usize> {
        if let Some(&i) = self.index.get(key) {
            if self.items.get(i).is_some_and(|item| item.key() == *key) {
                return Some(i);
            }
        }
        self.items.iter().position(|item| item.key() == *key)
    }

    pub fn contains_key(&self, key: &T::Key) -> bool {
        self.position_by(key).is_some()
    }

    pub fn push(&mut self, item: T) {
        self.index.entry(item.key()).or_insert(self.items.len());
        self.items.push(item);
    }

    /// Insert at `index`, clamped to the length
    pub fn insert(&mut self, index: usize, item: T) {
        let index = index.min(self.items.len());
        self.items.insert(index, item);
        self.reindex();
    }

    /// Remove the element at `index` and record it as deleted
    pub fn remove(&mut self, index: usize) -> Option<&T> {
        if index >= self.items.len() {
            return None;
        }
        let item = self.items.remove(index);
        self.reindex();
        self.deleting.push(item);
        self.deleting.last()
    }

    pub fn remove_by(&mut self, key: &T::Key) -> Option<&T> {
        let index = self.position_by(key)?;
        self.remove(index)
    }

    pub fn move_item(&mut self, from: usize, to: usize) {
        if from >= self.items.len() || to >= self.items.len() || from == to {
            return;
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        self.reindex();
    }

    pub fn swap(&mut self, a: usize, b: usize) {
        if a < self.items.len() && b < self.items.len() && a != b {
            self.items.swap(a, b);
            self.reindex();
        }
    }

    /// Replace the element at `index`; the previous element is recorded as
    /// deleted. Replacing an element with an equal one does nothing.
    pub fn replace(&mut self, index: usize, item: T)
    where
        T: PartialEq,
    {
        let Some(slot) = self.items.get_mut(index) else {
            return;
        };
        if *slot == item {
            return;
        }
        let old = std::mem::replace(slot, item);
        self.reindex();
        self.deleting.push(old);
    }

    /// Remove every element, recording each as deleted
    pub fn clear(&mut self) {
        self.deleting.append(&mut self.items);
        self.index.clear();
    }

    pub fn deleting(&self) -> &[T] {
        &self.deleting
    }

    /// Drain the deleted list
    pub fn take_deleting(&mut self) -> Vec<T> {
        std::mem::take(&mut self.deleting)
    }

    /// Keep only the deleted elements matching `keep`
    pub fn retain_deleting<F: FnMut(&T) -> bool>(&mut self, keep: F) {
        self.deleting.retain(keep);
    }
}

impl<'a, T: Keyed> IntoIterator for &'a KeyedCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        name: &'static str,
    }

    impl Keyed for Row {
        type Key = u32;

        fn key(&self) -> u32 {
            self.id
        }
    }

    fn row(id: u32, name: &'static str) -> Row {
        Row { id, name }
    }

    fn consistent(c: &KeyedCollection<Row>) -> bool {
        c.iter().enumerate().all(|(i, r)| c.position_by(&r.id) == Some(i))
            && c.index.iter().all(|(k, &i)| c.items[i].id == *k)
    }

    #[test]
    fn test_index_follows_inserts_and_moves() {
        let mut c = KeyedCollection::new();
        c.push(row(1, "a"));
        c.push(row(2, "b"));
        c.insert(0, row(3, "c"));
        assert!(consistent(&c));
        assert_eq!(c.get_by(&1).map(|r| r.name), Some("a"));
        c.move_item(0, 2);
        assert!(consistent(&c));
        assert_eq!(c.get(2).map(|r| r.id), Some(3));
        c.swap(0, 1);
        assert!(consistent(&c));
    }

    #[test]
    fn test_remove_records_deleted() {
        let mut c = KeyedCollection::new();
        c.push(row(1, "a"));
        c.push(row(2, "b"));
        assert_eq!(c.remove_by(&1).map(|r| r.id), Some(1));
        assert!(consistent(&c));
        assert!(c.get_by(&1).is_none());
        assert_eq!(c.deleting().len(), 1);
        assert_eq!(c.take_deleting().len(), 1);
        assert!(c.deleting().is_empty());
    }

    #[test]
    fn test_replace_and_clear() {
        let mut c = KeyedCollection::new();
        c.push(row(1, "a"));
        c.replace(0, row(1, "a"));
        assert!(c.deleting().is_empty());
        c.replace(0, row(5, "e"));
        assert!(consistent(&c));
        assert_eq!(c.deleting(), &[row(1, "a")]);
        c.clear();
        assert!(c.is_empty());
        assert_eq!(c.deleting().len(), 2);
        assert!(c.get_by(&5).is_none());
    }
}
