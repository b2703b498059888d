pub mod category;
pub mod store;

pub use category::EntityCategory;
pub use store::EntityStore;
