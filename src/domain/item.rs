//! Item Entity
//!
//! A shopping list entry. Unbought items are the visible list; buying an item
//! archives it.

use serde::{Deserialize, Serialize};
use super::entity::Entity;

/// Id carried by items that have not been persisted yet
pub const UNSAVED_ID: u32 = 0;

/// A shopping list item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier, assigned by the store on insert
    pub id: u32,
    /// Display name
    pub name: String,
    /// Bought items are archived and no longer visible
    pub bought: bool,
}

impl Item {
    /// Create an unsaved, unbought item
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: UNSAVED_ID,
            name: name.into(),
            bought: false,
        }
    }

    /// Check if the store has assigned an id
    pub fn is_persisted(&self) -> bool {
        self.id != UNSAVED_ID
    }

    /// Copy with `bought` set, all other fields unchanged
    pub fn as_bought(&self) -> Self {
        Self {
            bought: true,
            ..self.clone()
        }
    }

    /// Seed an edit draft from this item
    pub fn to_draft(&self) -> ItemDraft {
        ItemDraft {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

impl Entity for Item {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// In-progress edit of an item's name. Never persisted directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    /// 0 for a not-yet-created item
    pub id: u32,
    pub name: String,
}

impl ItemDraft {
    pub fn is_new(&self) -> bool {
        self.id == UNSAVED_ID
    }

    pub fn is_valid(&self) -> bool {
        is_valid_name(&self.name)
    }

    /// Build the item to write: trimmed name, unbought
    pub fn to_item(&self) -> Item {
        Item {
            id: self.id,
            name: trim_name(&self.name).to_string(),
            bought: false,
        }
    }
}

fn is_blank(c: char) -> bool {
    c.is_whitespace() || c.is_control()
}

/// Strip surrounding whitespace and control characters
pub fn trim_name(name: &str) -> &str {
    name.trim_matches(is_blank)
}

/// A name is valid when something other than whitespace or control characters remains
pub fn is_valid_name(name: &str) -> bool {
    !trim_name(name).is_empty()
}
