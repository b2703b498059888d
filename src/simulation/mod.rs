//! The mutation domain and the game logic that runs inside it

pub mod domain;
pub mod spawner;

pub use domain::{DomainHandle, MutationDomain};
pub use spawner::PopulationSpawner;
