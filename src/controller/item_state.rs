//! Item State Controller
//!
//! Owns the two observable states the presentation layer renders (the visible
//! item list and the edit session) and mediates every write to the store.
//! Meant to be driven from one coordinating context; session changes are
//! published synchronously, store writes are awaited before the session moves.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

use crate::domain::{DomainError, EditSession, Item};
use crate::repository::ItemsRepository;
use super::edit_session::EditSessionMachine;
use super::shared_list::{SharedItemList, VisibleItems, DEFAULT_GRACE};

/// Controller-level failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemStateError {
    /// Commit attempted with an empty or whitespace-only name
    #[error("item name must not be empty")]
    ValidationRejected,
    /// Commit attempted while no edit session is open
    #[error("no edit session is open")]
    MissingSession,
    #[error("store write failed: {0}")]
    StoreWriteFailed(#[source] DomainError),
}

pub type ItemStateResult<T> = Result<T, ItemStateError>;

pub struct ItemStateController {
    repository: ItemsRepository,
    visible: SharedItemList,
    machine: Mutex<EditSessionMachine>,
    session: watch::Sender<EditSession>,
}

impl ItemStateController {
    pub fn new(repository: ItemsRepository) -> Self {
        Self::with_grace(repository, DEFAULT_GRACE)
    }

    /// `grace` is how long the store subscription outlives its last observer
    pub fn with_grace(repository: ItemsRepository, grace: Duration) -> Self {
        let (session, _) = watch::channel(EditSession::closed());
        Self {
            visible: SharedItemList::new(repository.clone(), grace),
            repository,
            machine: Mutex::new(EditSessionMachine::new()),
            session,
        }
    }

    /// Live unbought items, newest first. Must be called within a Tokio runtime.
    pub fn observe_visible_items(&self) -> VisibleItems {
        self.visible.subscribe()
    }

    pub fn observe_edit_session(&self) -> watch::Receiver<EditSession> {
        self.session.subscribe()
    }

    /// Current edit session snapshot
    pub fn edit_session(&self) -> EditSession {
        self.session.borrow().clone()
    }

    pub fn start_new_item(&self) {
        self.apply(EditSessionMachine::start_new);
        log::debug!("edit session: new item");
    }

    pub fn start_edit_item(&self, item: &Item) {
        self.apply(|machine| machine.start_edit(item));
        log::debug!("edit session: editing item {}", item.id);
    }

    pub fn update_draft_name(&self, name: impl Into<String>) {
        let name = name.into();
        if !self.apply(|machine| machine.update_name(name)) {
            log::debug!("edit session: name update ignored, no session open");
        }
    }

    pub fn cancel_editing(&self) {
        if self.apply(EditSessionMachine::cancel) {
            log::debug!("edit session: cancelled");
        }
    }

    /// Validate the draft and write it to the store
    ///
    /// Inserts when the session is new, updates otherwise. The session is
    /// closed only after the store confirms; on failure it stays open with the
    /// draft untouched.
    pub async fn commit_editing(&self) -> ItemStateResult<Item> {
        let (session, epoch) = {
            let machine = self.machine();
            (machine.session().clone(), machine.epoch())
        };

        if !session.is_editing {
            return Err(ItemStateError::MissingSession);
        }
        if !session.is_valid {
            log::debug!("edit session: commit rejected, draft is invalid");
            return Err(ItemStateError::ValidationRejected);
        }

        let item = session.draft.to_item();
        let written = if session.is_new {
            self.repository.add(&item).await
        } else {
            self.repository.update(&item).await.map(|()| item)
        };
        let saved = written.map_err(|e| {
            log::warn!("edit session: commit failed: {}", e);
            ItemStateError::StoreWriteFailed(e)
        })?;

        if self.apply(|machine| machine.close_if_current(epoch)) {
            log::debug!("edit session: committed item {}", saved.id);
        }
        Ok(saved)
    }

    pub async fn remove_item(&self, item: &Item) -> ItemStateResult<()> {
        self.repository.remove(item).await.map_err(|e| {
            log::warn!("failed to remove item {}: {}", item.id, e);
            ItemStateError::StoreWriteFailed(e)
        })
    }

    /// Archive an item; it leaves the visible list for good
    pub async fn mark_bought(&self, item: &Item) -> ItemStateResult<()> {
        self.repository.update(&item.as_bought()).await.map_err(|e| {
            log::warn!("failed to mark item {} bought: {}", item.id, e);
            ItemStateError::StoreWriteFailed(e)
        })
    }

    /// Unsubscribe from the store and detach in-flight commits from the session
    ///
    /// Writes already handed to the store still complete.
    pub fn shutdown(&self) {
        self.machine().invalidate();
        self.visible.shutdown();
    }

    fn machine(&self) -> MutexGuard<'_, EditSessionMachine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a transition and publish the session if it changed
    fn apply<R>(&self, transition: impl FnOnce(&mut EditSessionMachine) -> R) -> R {
        let mut machine = self.machine();
        let result = transition(&mut *machine);
        self.session.send_if_modified(|published| {
            if *published == *machine.session() {
                false
            } else {
                *published = machine.session().clone();
                true
            }
        });
        result
    }
}

impl Drop for ItemStateController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
