//! Collections of entities sharing one logical entity name.

use super::{EntitySet, Keyed, KeyedCollection};
use crate::entity::{Entity, EntityState};
use crate::value::Value;

impl Keyed for Entity {
    type Key = String;

    fn key(&self) -> String {
        self.entity_id()
    }
}

/// Ordered entity collection, indexed by entity id.
///
/// Removing an entity records it for deletion unless it is still
/// `Created`: such an entity never reached the store, so there is nothing
/// to delete.
#[derive(Debug, Clone, Default)]
pub struct EntityCollection {
    entity_name: String,
    entities: KeyedCollection<Entity>,
    /// Continuation token of a paged read
    pub paging_cookie: Option<String>,
    /// Whether the store holds more records than were returned
    pub has_more: bool,
    /// Total record count reported by the store
    pub total_count: i64,
}

impl EntityCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty collection with a fixed entity name
    pub fn named(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            ..Self::default()
        }
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn set_entity_name(&mut self, name: impl Into<String>) {
        self.entity_name = name.into();
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index)
    }

    /// Entity by id
    pub fn get_by(&self, id: &str) -> Option<&Entity> {
        self.entities.get_by(&id.to_string())
    }

    fn adopt_name(&mut self, entity: &Entity) {
        if self.entity_name.is_empty() {
            self.entity_name = entity.entity_name();
        }
    }

    /// Append; the first entity added names an unnamed collection
    pub fn push(&mut self, entity: Entity) {
        self.adopt_name(&entity);
        self.entities.push(entity);
    }

    pub fn insert(&mut self, index: usize, entity: Entity) {
        self.adopt_name(&entity);
        self.entities.insert(index, entity);
    }

    /// Remove the entity at `index`
    pub fn remove(&mut self, index: usize) -> Option<Entity> {
        let removed = self.entities.remove(index).cloned()?;
        if removed.state() == EntityState::Created {
            self.entities.retain_deleting(|e| !e.ptr_eq(&removed));
        }
        Some(removed)
    }

    /// Remove the given entity handle, if present
    pub fn remove_entity(&mut self, entity: &Entity) -> bool {
        match self.entities.iter().position(|e| e.ptr_eq(entity)) {
            Some(index) => self.remove(index).is_some(),
            None => false,
        }
    }

    /// Remove every entity; those still `Created` are not recorded as deleted
    pub fn clear(&mut self) {
        self.entities.clear();
        self.entities
            .retain_deleting(|e| e.state() != EntityState::Created);
    }

    pub fn swap(&mut self, a: usize, b: usize) {
        self.entities.swap(a, b);
    }

    /// Entities in state `Created`
    pub fn creating(&self) -> Vec<Entity> {
        self.by_state(EntityState::Created)
    }

    /// Entities in state `Modified`
    pub fn updating(&self) -> Vec<Entity> {
        self.by_state(EntityState::Modified)
    }

    /// Entities removed from the collection that exist in the store
    pub fn deleting(&self) -> Vec<Entity> {
        self.entities.deleting().to_vec()
    }

    fn by_state(&self, state: EntityState) -> Vec<Entity> {
        self.entities
            .iter()
            .filter(|e| e.state() == state)
            .cloned()
            .collect()
    }

    /// Reorder so that parents tend to precede their children.
    ///
    /// A single forward scan: for each position, the first later entity
    /// whose primary key equals this entity's parent key value is swapped
    /// in front, and the scan re-examines that position. This is not a full
    /// topological sort. A position is left after `len` swaps, which bounds
    /// the scan when parent links form a cycle.
    pub fn sort(&mut self, primary_key: &str, parent_key: &str) {
        if primary_key.is_empty() || parent_key.is_empty() {
            return;
        }
        let mut idx = 0usize;
        let mut swaps = 0usize;
        while idx + 1 < self.len() {
            if swaps > self.len() {
                log::warn!("{}: parent cycle at position {}", self.entity_name, idx);
                idx += 1;
                swaps = 0;
                continue;
            }
            let parent_id = match self.entities.get(idx).and_then(|e| e.get_item_value(parent_key)) {
                Some(Value::Null) | None => None,
                Some(Value::Reference(r)) if r.entity_name != self.entity_name => None,
                Some(Value::Reference(r)) => Some(r.id),
                Some(other) => Some(other.to_string()),
            };
            if let Some(parent_id) = parent_id.filter(|id| !id.is_empty()) {
                let found = (idx + 1..self.len()).find(|&i| {
                    let id = match self.entities.get(i).and_then(|e| e.get_item_value(primary_key)) {
                        Some(Value::Reference(r)) => r.id,
                        Some(other) => other.to_string(),
                        None => String::new(),
                    };
                    id == parent_id
                });
                if let Some(i) = found {
                    self.entities.swap(idx, i);
                    swaps += 1;
                    continue;
                }
            }
            idx += 1;
            swaps = 0;
        }
    }
}

impl EntitySet for EntityCollection {
    fn creating(&self) -> Vec<Entity> {
        EntityCollection::creating(self)
    }

    fn updating(&self) -> Vec<Entity> {
        EntityCollection::updating(self)
    }

    fn take_deleting(&mut self) -> Vec<Entity> {
        self.entities.take_deleting()
    }
}

impl<'a> IntoIterator for &'a EntityCollection {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

impl FromIterator<Entity> for EntityCollection {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut collection = EntityCollection::new();
        for entity in iter {
            collection.push(entity);
        }
        collection
    }
}
