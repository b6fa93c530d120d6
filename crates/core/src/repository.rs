//! Ordered in-memory repository for one entity kind.
//!
//! Policy on primary identifiers:
//! - insert never checks uniqueness, so duplicates coexist
//! - find returns the first match in current order
//! - delete removes every match
//!
//! Lookups are linear scans over insertion order.

use crate::entities::Entity;

#[derive(Clone, Debug)]
pub struct Repository<E> {
    entries: Vec<E>,
}

impl<E> Default for Repository<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E: Entity> Repository<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entity` after every existing entry.
    pub fn insert(&mut self, entity: E) {
        self.entries.push(entity);
    }

    pub fn extend(&mut self, entities: impl IntoIterator<Item = E>) {
        self.entries.extend(entities);
    }

    /// Removes every entity whose primary identifier equals `id`.
    ///
    /// Returns the number removed; survivors keep their relative order.
    pub fn delete_by_key(&mut self, id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.primary_id() != id);
        before - self.entries.len()
    }

    /// First entity (in current order) whose primary identifier equals `id`.
    pub fn find_by_key(&self, id: &str) -> Option<&E> {
        self.entries.iter().find(|e| e.primary_id() == id)
    }

    /// Every entity, in current order.
    pub fn all(&self) -> &[E] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
