//! Edit Session
//!
//! Snapshot of the single-item editing surface: whether it is shown, whether
//! committing creates or updates, the draft, and the draft's validity.

use serde::{Deserialize, Serialize};
use super::item::ItemDraft;

/// Coarse state of the edit session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditState {
    Closed,
    EditingNew,
    EditingExisting,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSession {
    pub is_editing: bool,
    pub is_new: bool,
    pub draft: ItemDraft,
    pub is_valid: bool,
}

impl EditSession {
    /// A closed session with an empty draft
    pub fn closed() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EditState {
        match (self.is_editing, self.is_new) {
            (false, _) => EditState::Closed,
            (true, true) => EditState::EditingNew,
            (true, false) => EditState::EditingExisting,
        }
    }
}
