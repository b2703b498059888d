//! Reducer - removes every filtered entity

use crate::ecs::world::Server;
use crate::population::filter::FilterSet;
use crate::population::WorldFailure;

/// Outcome of one reduction pass
///
/// Removals are terminal; a pass with failures still keeps what it removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupResult {
    pub removed: usize,
    pub failures: Vec<WorldFailure>,
}

impl CleanupResult {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Removes the population matching a FilterSet
pub struct Reducer<'a> {
    filter: &'a FilterSet,
}

impl<'a> Reducer<'a> {
    pub fn new(filter: &'a FilterSet) -> Self {
        Self { filter }
    }

    /// Remove matching entities across every world. Must run in the mutation domain.
    pub fn reduce(&self, server: &mut Server) -> CleanupResult {
        let mut result = CleanupResult::default();
        if self.filter.is_empty() {
            return result;
        }

        for world in &mut server.worlds {
            // Iterate a copy so removal never invalidates the enumeration
            let entities = match world.entity_snapshot() {
                Ok(entities) => entities,
                Err(e) => {
                    tracing::warn!(world = %world.name, error = %e, "Error during entity cleanup");
                    result.failures.push(WorldFailure {
                        world: world.name.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            for (id, category) in entities {
                if !self.filter.contains(category) {
                    continue;
                }
                match world.remove_entity(id) {
                    Ok(true) => result.removed += 1,
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!(world = %world.name, error = %e, "World became unavailable mid-cleanup");
                        result.failures.push(WorldFailure {
                            world: world.name.clone(),
                            reason: e.to_string(),
                        });
                        break;
                    }
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::category::EntityCategory;
    use proptest::prelude::*;

    #[test]
    fn test_removes_only_filtered() {
        let mut server = Server::with_worlds(["overworld"]);
        server.spawn(0, EntityCategory::Arrow);
        server.spawn(0, EntityCategory::Arrow);
        let villager = server.spawn(0, EntityCategory::Villager).unwrap();
        let filter = FilterSet::from_iter([EntityCategory::Arrow]);

        let result = Reducer::new(&filter).reduce(&mut server);
        assert_eq!(result.removed, 2);
        assert_eq!(server.entity_count(), 1);
        assert_eq!(
            server.worlds[0].entities.category_of(villager),
            Some(EntityCategory::Villager)
        );
    }

    #[test]
    fn test_second_pass_removes_nothing() {
        let mut server = Server::with_worlds(["overworld"]);
        for _ in 0..10 {
            server.spawn(0, EntityCategory::ExperienceOrb);
        }
        let filter = FilterSet::from_iter([EntityCategory::ExperienceOrb]);
        let reducer = Reducer::new(&filter);

        assert_eq!(reducer.reduce(&mut server).removed, 10);
        assert_eq!(reducer.reduce(&mut server), CleanupResult::default());
    }

    #[test]
    fn test_unloaded_world_is_skipped() {
        let mut server = Server::with_worlds(["overworld", "nether"]);
        server.spawn(0, EntityCategory::Arrow);
        server.spawn(1, EntityCategory::Arrow);
        server.world_mut("overworld").unwrap().set_loaded(false);
        let filter = FilterSet::from_iter([EntityCategory::Arrow]);

        let result = Reducer::new(&filter).reduce(&mut server);
        assert_eq!(result.removed, 1);
        assert!(result.is_partial());
        assert_eq!(server.worlds[0].entity_count(), 1);
        assert_eq!(server.worlds[1].entity_count(), 0);
    }

    fn category() -> impl Strategy<Value = EntityCategory> {
        (0..EntityCategory::ALL.len()).prop_map(|i| EntityCategory::ALL[i])
    }

    proptest! {
        #[test]
        fn prop_reduce_removes_exactly_the_filtered_subset(
            population in prop::collection::vec((0usize..3, category()), 0..200),
            filtered in prop::collection::vec(category(), 0..6),
        ) {
            let mut server = Server::with_worlds(["a", "b", "c"]);
            for (world, cat) in &population {
                server.spawn(*world, *cat);
            }
            let filter: FilterSet = filtered.into_iter().collect();
            let expected_removed = population.iter().filter(|(_, c)| filter.contains(*c)).count();

            let result = Reducer::new(&filter).reduce(&mut server);

            prop_assert_eq!(result.removed, expected_removed);
            prop_assert_eq!(server.entity_count(), population.len() - expected_removed);
            for cat in EntityCategory::ALL {
                let before = population.iter().filter(|(_, c)| *c == cat).count();
                let after = server.count_of(cat);
                if filter.contains(cat) {
                    prop_assert_eq!(after, 0);
                } else {
                    prop_assert_eq!(after, before);
                }
            }
            prop_assert_eq!(Reducer::new(&filter).reduce(&mut server).removed, 0);
        }
    }
}
