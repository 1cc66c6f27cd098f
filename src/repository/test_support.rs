//! Test doubles for the item store

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::domain::{DomainError, DomainResult, Item};
use super::{init_db, ItemStore, ItemStream, SqliteItemStore, IN_MEMORY};

/// In-memory SQLite store whose writes can be made to fail on demand
pub struct FlakyStore {
    inner: SqliteItemStore,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyStore {
    pub async fn new() -> Arc<Self> {
        let db = init_db(Path::new(IN_MEMORY)).await.expect("Failed to init test DB");
        let inner = SqliteItemStore::open(&db).await.expect("Failed to open store");
        Arc::new(Self {
            inner,
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    /// Write attempts that reached the store, failed or not
    pub fn write_attempts(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_write(&self) -> DomainResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::Internal("disk I/O error".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ItemStore for FlakyStore {
    async fn insert(&self, item: &Item) -> DomainResult<Item> {
        self.check_write()?;
        self.inner.insert(item).await
    }

    async fn update(&self, item: &Item) -> DomainResult<()> {
        self.check_write()?;
        self.inner.update(item).await
    }

    async fn delete(&self, item: &Item) -> DomainResult<()> {
        self.check_write()?;
        self.inner.delete(item).await
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Item>> {
        self.inner.find_by_id(id).await
    }

    fn query_unbought(&self) -> ItemStream {
        self.inner.query_unbought()
    }
}

/// In-memory SQLite store whose writes wait until the gate is opened
pub struct GatedStore {
    inner: SqliteItemStore,
    gate: Notify,
    waiting: AtomicUsize,
}

impl GatedStore {
    pub async fn new() -> Arc<Self> {
        let db = init_db(Path::new(IN_MEMORY)).await.expect("Failed to init test DB");
        let inner = SqliteItemStore::open(&db).await.expect("Failed to open store");
        Arc::new(Self {
            inner,
            gate: Notify::new(),
            waiting: AtomicUsize::new(0),
        })
    }

    /// Let one held (or the next) write through
    pub fn open_gate(&self) {
        self.gate.notify_one();
    }

    /// Writes currently held at the gate
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    async fn pass_gate(&self) {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        self.waiting.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ItemStore for GatedStore {
    async fn insert(&self, item: &Item) -> DomainResult<Item> {
        self.pass_gate().await;
        self.inner.insert(item).await
    }

    async fn update(&self, item: &Item) -> DomainResult<()> {
        self.pass_gate().await;
        self.inner.update(item).await
    }

    async fn delete(&self, item: &Item) -> DomainResult<()> {
        self.pass_gate().await;
        self.inner.delete(item).await
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Item>> {
        self.inner.find_by_id(id).await
    }

    fn query_unbought(&self) -> ItemStream {
        self.inner.query_unbought()
    }
}
