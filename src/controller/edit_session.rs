//! Edit Session State Machine
//!
//! Single slot holding at most one open draft. Opening a session always
//! replaces whatever was there; closing keeps the last draft readable until
//! the next open.
//!
//! ```text
//! Closed ──start_new──► EditingNew ──commit [valid]──► Closed
//! Closed ──start_edit─► EditingExisting ──commit [valid]──► Closed
//! Editing* ──update_name──► same state
//! Editing* ──cancel──► Closed
//! Editing* ──start_*──► Editing* (prior draft dropped)
//! ```

use crate::domain::{EditSession, Item, ItemDraft};

#[derive(Debug, Default)]
pub struct EditSessionMachine {
    session: EditSession,
    /// Bumped on every open so a late commit can tell its session was replaced
    epoch: u64,
}

impl EditSessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn start_new(&mut self) {
        self.open(true, ItemDraft::default());
    }

    pub fn start_edit(&mut self, item: &Item) {
        self.open(false, item.to_draft());
    }

    /// Replace the draft name; `false` when no session is open
    pub fn update_name(&mut self, name: String) -> bool {
        if !self.session.is_editing {
            return false;
        }
        self.session.draft.name = name;
        self.session.is_valid = self.session.draft.is_valid();
        true
    }

    /// Close without writing; `false` when already closed
    pub fn cancel(&mut self) -> bool {
        if !self.session.is_editing {
            return false;
        }
        self.session.is_editing = false;
        true
    }

    /// Close after a confirmed write, unless the session was replaced or
    /// closed while the write was in flight
    pub fn close_if_current(&mut self, epoch: u64) -> bool {
        if self.epoch != epoch || !self.session.is_editing {
            return false;
        }
        self.session.is_editing = false;
        true
    }

    /// Detach any in-flight commit from this machine
    pub fn invalidate(&mut self) {
        self.epoch += 1;
    }

    fn open(&mut self, is_new: bool, draft: ItemDraft) {
        self.epoch += 1;
        let is_valid = draft.is_valid();
        self.session = EditSession {
            is_editing: true,
            is_new,
            draft,
            is_valid,
        };
    }
}
