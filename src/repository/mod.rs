//! Repository Layer
//!
//! Item store abstraction, its SQLite implementation, and the repository
//! adapter the controller talks to.

mod traits;
mod db;
mod item_store;
mod items_repository;

#[cfg(test)]
pub(crate) mod test_support;


pub use traits::{ItemStore, ItemStream};
pub use db::{init_db, DbState, IN_MEMORY};
pub use item_store::SqliteItemStore;
pub use items_repository::ItemsRepository;
