//! Population spawner
//!
//! Stands in for game logic: every step advances the server tick and spawns
//! a few random entities, weighted towards short-lived drops and projectiles.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::ecs::world::Server;
use crate::entity::category::EntityCategory;

/// Relative spawn weights, roughly what a busy survival server produces
const SPAWN_WEIGHTS: [(EntityCategory, u32); 12] = [
    (EntityCategory::DroppedItem, 30),
    (EntityCategory::ExperienceOrb, 15),
    (EntityCategory::Arrow, 10),
    (EntityCategory::Snowball, 3),
    (EntityCategory::Egg, 3),
    (EntityCategory::FallingBlock, 4),
    (EntityCategory::Zombie, 8),
    (EntityCategory::Skeleton, 6),
    (EntityCategory::Creeper, 4),
    (EntityCategory::Cow, 5),
    (EntityCategory::Sheep, 5),
    (EntityCategory::Villager, 2),
];

pub struct PopulationSpawner {
    rng: ChaCha8Rng,
    per_tick: usize,
    total_weight: u32,
}

impl PopulationSpawner {
    pub fn new(seed: u64, per_tick: usize) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            per_tick,
            total_weight: SPAWN_WEIGHTS.iter().map(|(_, w)| w).sum(),
        }
    }

    /// One game tick: advance time and spawn
    pub fn step(&mut self, server: &mut Server) {
        server.tick();
        if server.worlds.is_empty() {
            return;
        }
        for _ in 0..self.per_tick {
            let world = self.rng.gen_range(0..server.worlds.len());
            let category = self.pick_category();
            server.spawn(world, category);
        }
    }

    fn pick_category(&mut self) -> EntityCategory {
        let mut roll = self.rng.gen_range(0..self.total_weight);
        for (category, weight) in SPAWN_WEIGHTS {
            if roll < weight {
                return category;
            }
            roll -= weight;
        }
        EntityCategory::DroppedItem
    }
}
