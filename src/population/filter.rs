//! FilterSet - which entity categories are eligible for removal

use ahash::AHashSet;

use crate::entity::category::EntityCategory;

/// Immutable set of categories eligible for sampling and removal
///
/// An empty set never matches; sampling and reduction then do nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    categories: AHashSet<EntityCategory>,
}

impl FilterSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from configured names, skipping (and logging) unknown ones
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut categories = AHashSet::new();
        for name in names {
            let name = name.as_ref();
            match name.parse::<EntityCategory>() {
                Ok(category) => {
                    categories.insert(category);
                }
                Err(_) => {
                    tracing::warn!(name, "Invalid entity category in entities-to-clear, skipped");
                }
            }
        }
        Self { categories }
    }

    pub fn contains(&self, category: EntityCategory) -> bool {
        self.categories.contains(&category)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Categories in stable (declaration) order, for logs and status output
    pub fn sorted(&self) -> Vec<EntityCategory> {
        let mut categories: Vec<_> = self.categories.iter().copied().collect();
        categories.sort();
        categories
    }
}

impl FromIterator<EntityCategory> for FilterSet {
    fn from_iter<T: IntoIterator<Item = EntityCategory>>(iter: T) -> Self {
        Self {
            categories: iter.into_iter().collect(),
        }
    }
}
