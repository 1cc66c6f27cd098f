//! Repository Layer - Core Traits
//!
//! Defines the abstract interface of the item store.
//! Implementations can use SQLite, in-memory, etc.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::{DomainResult, Item};

/// Durable item store keyed by an auto-assigned integer id
///
/// All writes are async to support various backends. After a write that
/// changes the unbought set, every live [`ItemStream`] receives the new
/// snapshot.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Persist a new unbought item, returning it with its assigned id
    async fn insert(&self, item: &Item) -> DomainResult<Item>;

    /// Overwrite the record keyed by `item.id`; `NotFound` if absent
    async fn update(&self, item: &Item) -> DomainResult<()>;

    /// Remove the record keyed by `item.id`; removing a missing record succeeds
    async fn delete(&self, item: &Item) -> DomainResult<()>;

    /// Find one record, bought or not
    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Item>>;

    /// Live query of unbought items, ordered by id descending
    fn query_unbought(&self) -> ItemStream;
}

/// Live subscription to the unbought item set
///
/// The first [`next`](Self::next) yields the current snapshot; each later call
/// waits for a change and yields the full new snapshot. Snapshots published
/// faster than they are read are conflated to the latest one.
#[derive(Debug)]
pub struct ItemStream {
    rx: watch::Receiver<Vec<Item>>,
    primed: bool,
}

impl ItemStream {
    pub fn new(rx: watch::Receiver<Vec<Item>>) -> Self {
        Self { rx, primed: false }
    }

    /// Next snapshot, or `None` once the store has gone away
    pub async fn next(&mut self) -> Option<Vec<Item>> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
