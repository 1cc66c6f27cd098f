//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer has NO external dependencies (except serde for serialization
//! and thiserror for error types).

mod entity;
mod item;
mod session;

pub use entity::{Entity, DomainError, DomainResult};
pub use item::{Item, ItemDraft, UNSAVED_ID, is_valid_name, trim_name};
pub use session::{EditSession, EditState};
