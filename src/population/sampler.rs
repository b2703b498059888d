//! Sampler - read-only count of filtered entities

use crate::ecs::world::Server;
use crate::population::filter::FilterSet;
use crate::population::WorldFailure;

/// Count produced by one sampling pass. Consumed immediately, never retained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleResult {
    pub count: usize,
    pub failures: Vec<WorldFailure>,
}

impl SampleResult {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Counts the current population matching a FilterSet
pub struct Sampler<'a> {
    filter: &'a FilterSet,
}

impl<'a> Sampler<'a> {
    pub fn new(filter: &'a FilterSet) -> Self {
        Self { filter }
    }

    /// Count matching entities across every world. Must run in the mutation domain.
    pub fn sample(&self, server: &Server) -> SampleResult {
        let mut result = SampleResult::default();
        if self.filter.is_empty() {
            return result;
        }

        for world in &server.worlds {
            match world.entity_snapshot() {
                Ok(entities) => {
                    result.count += entities
                        .iter()
                        .filter(|(_, category)| self.filter.contains(*category))
                        .count();
                }
                Err(e) => {
                    tracing::warn!(world = %world.name, error = %e, "Error during entity counting");
                    result.failures.push(WorldFailure {
                        world: world.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(count = result.count, "Sampled filtered population");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::category::EntityCategory;

    fn server_with(categories: &[EntityCategory]) -> Server {
        let mut server = Server::with_worlds(["overworld", "nether"]);
        for (i, category) in categories.iter().enumerate() {
            server.spawn(i % 2, *category);
        }
        server
    }

    #[test]
    fn test_counts_only_filtered() {
        let server = server_with(&[
            EntityCategory::Arrow,
            EntityCategory::Arrow,
            EntityCategory::Cow,
            EntityCategory::DroppedItem,
        ]);
        let filter = FilterSet::from_iter([EntityCategory::Arrow, EntityCategory::DroppedItem]);

        let result = Sampler::new(&filter).sample(&server);
        assert_eq!(result.count, 3);
        assert!(!result.is_partial());
    }

    #[test]
    fn test_sampling_does_not_mutate() {
        let server = server_with(&[EntityCategory::Arrow; 5]);
        let filter = FilterSet::from_iter([EntityCategory::Arrow]);

        Sampler::new(&filter).sample(&server);
        assert_eq!(server.entity_count(), 5);
    }

    #[test]
    fn test_failed_world_does_not_abort_pass() {
        let mut server = server_with(&[EntityCategory::Arrow; 4]);
        server.world_mut("nether").unwrap().set_loaded(false);
        let filter = FilterSet::from_iter([EntityCategory::Arrow]);

        let result = Sampler::new(&filter).sample(&server);
        assert_eq!(result.count, 2);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].world, "nether");
    }

    #[test]
    fn test_empty_filter_is_noop() {
        let server = server_with(&[EntityCategory::Arrow; 3]);
        let result = Sampler::new(&FilterSet::empty()).sample(&server);
        assert_eq!(result, SampleResult::default());
    }
}
