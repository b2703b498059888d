//! ECS World - every world (namespace) of the running server and their entities

use crate::core::error::{ClearlagError, Result};
use crate::core::types::{EntityId, Tick};
use crate::entity::category::EntityCategory;
use crate::entity::store::EntityStore;

/// One world / namespace of the simulation
pub struct World {
    pub name: String,
    pub entities: EntityStore,
    loaded: bool,
}

impl World {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: EntityStore::new(),
            loaded: true,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Mark the world as loaded or unloaded. Unloaded worlds refuse enumeration.
    pub fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    pub fn entity_count(&self) -> usize {
        self.entities.count()
    }

    /// Copy of the world's population taken at this instant
    pub fn entity_snapshot(&self) -> Result<Vec<(EntityId, EntityCategory)>> {
        if !self.loaded {
            return Err(ClearlagError::WorldUnavailable(self.name.clone()));
        }
        Ok(self.entities.snapshot())
    }

    /// Terminal removal. Returns false if the entity no longer exists.
    pub fn remove_entity(&mut self, id: EntityId) -> Result<bool> {
        if !self.loaded {
            return Err(ClearlagError::WorldUnavailable(self.name.clone()));
        }
        Ok(self.entities.remove(id))
    }
}

/// The game server containing all worlds
pub struct Server {
    pub current_tick: Tick,
    pub worlds: Vec<World>,
}

impl Server {
    pub fn new() -> Self {
        Self {
            current_tick: 0,
            worlds: Vec::new(),
        }
    }

    /// Server with one empty world per name
    pub fn with_worlds<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut server = Self::new();
        for name in names {
            server.add_world(name);
        }
        server
    }

    pub fn add_world(&mut self, name: impl Into<String>) -> usize {
        self.worlds.push(World::new(name));
        self.worlds.len() - 1
    }

    pub fn world(&self, name: &str) -> Option<&World> {
        self.worlds.iter().find(|w| w.name == name)
    }

    pub fn world_mut(&mut self, name: &str) -> Option<&mut World> {
        self.worlds.iter_mut().find(|w| w.name == name)
    }

    /// Spawn into the world at `world_idx`. None if there is no such world.
    pub fn spawn(&mut self, world_idx: usize, category: EntityCategory) -> Option<EntityId> {
        let tick = self.current_tick;
        let world = self.worlds.get_mut(world_idx)?;
        let id = EntityId::new();
        world.entities.spawn(id, category, tick);
        Some(id)
    }

    pub fn entity_count(&self) -> usize {
        self.worlds.iter().map(World::entity_count).sum()
    }

    pub fn count_of(&self, category: EntityCategory) -> usize {
        self.worlds
            .iter()
            .map(|w| w.entities.count_of(category))
            .sum()
    }

    pub fn tick(&mut self) {
        self.current_tick += 1;
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}
