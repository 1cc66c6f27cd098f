//! Shopping List Core
//!
//! Layered architecture:
//! - domain: Core entities and business rules
//! - repository: Item store abstraction, SQLite store, repository adapter
//! - controller: Item state controller (visible list + edit session)
//! - config / app: settings and wiring for a host

pub mod domain;
pub mod repository;
pub mod controller;
pub mod config;
mod app;

pub use app::{start, ShoppingList, StartError};
pub use config::{AppConfig, ConfigError};
pub use controller::{ItemStateController, ItemStateError, VisibleItems};
pub use domain::{EditSession, EditState, Item, ItemDraft};
