//! Entity storage with SoA layout

use ahash::AHashMap;

use crate::core::types::{EntityId, Tick};
use crate::entity::category::EntityCategory;

/// Structure of Arrays for the entities of one world
///
/// Removal is swap-remove, so indices are not stable across removals.
/// Look entities up by id through `index_of`.
#[derive(Debug, Default)]
pub struct EntityStore {
    pub ids: Vec<EntityId>,
    pub categories: Vec<EntityCategory>,
    pub spawn_ticks: Vec<Tick>,
    index: AHashMap<EntityId, usize>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn spawn(&mut self, id: EntityId, category: EntityCategory, tick: Tick) {
        self.index.insert(id, self.ids.len());
        self.ids.push(id);
        self.categories.push(category);
        self.spawn_ticks.push(tick);
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn category_of(&self, id: EntityId) -> Option<EntityCategory> {
        self.index_of(id).map(|idx| self.categories[idx])
    }

    /// Remove an entity. Returns false if it was already gone.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(idx) = self.index.remove(&id) else {
            return false;
        };

        self.ids.swap_remove(idx);
        self.categories.swap_remove(idx);
        self.spawn_ticks.swap_remove(idx);

        // The former last element now lives at idx
        if let Some(moved) = self.ids.get(idx) {
            self.index.insert(*moved, idx);
        }
        true
    }

    /// Copy of (id, category) pairs at this instant
    pub fn snapshot(&self) -> Vec<(EntityId, EntityCategory)> {
        self.ids
            .iter()
            .copied()
            .zip(self.categories.iter().copied())
            .collect()
    }

    pub fn count_of(&self, category: EntityCategory) -> usize {
        self.categories.iter().filter(|c| **c == category).count()
    }
}
