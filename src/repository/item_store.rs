//! Item Store Implementation
//!
//! SQLite-backed implementation of [`ItemStore`]. Every write that changes the
//! unbought set re-runs the visible-list query on the same connection and
//! publishes the snapshot to live subscribers.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use crate::domain::{DomainError, DomainResult, Entity, Item};
use super::db::DbState;
use super::traits::{ItemStore, ItemStream};

const SELECT_UNBOUGHT: &str = "SELECT id, name, bought FROM items WHERE bought = 0 ORDER BY id DESC";

/// SQLite implementation of the item store
pub struct SqliteItemStore {
    conn: Arc<Mutex<Connection>>,
    unbought: watch::Sender<Vec<Item>>,
}

impl SqliteItemStore {
    pub async fn new(conn: Arc<Mutex<Connection>>) -> DomainResult<Self> {
        let initial = {
            let guard = conn.lock().await;
            select_unbought(&guard)?
        };
        let (unbought, _) = watch::channel(initial);
        Ok(Self { conn, unbought })
    }

    pub async fn open(db: &DbState) -> DomainResult<Self> {
        Self::new(db.connection()).await
    }

    /// Re-run the visible-list query and notify subscribers if it changed
    ///
    /// The write has already succeeded, so a failed refresh is logged rather
    /// than reported to the writer.
    fn publish(&self, conn: &Connection) {
        match select_unbought(conn) {
            Ok(items) => {
                self.unbought.send_if_modified(|current| {
                    if *current == items {
                        false
                    } else {
                        *current = items;
                        true
                    }
                });
            }
            Err(e) => log::warn!("failed to refresh unbought items: {}", e),
        }
    }
}

#[async_trait]
impl ItemStore for SqliteItemStore {
    async fn insert(&self, item: &Item) -> DomainResult<Item> {
        let conn = self.conn.lock().await;

        conn.execute(
            "INSERT INTO items (name, bought) VALUES (?1, ?2)",
            params![item.name, item.bought],
        )?;

        let id = u32::try_from(conn.last_insert_rowid())
            .map_err(|e| DomainError::Internal(format!("Item id out of range: {}", e)))?;
        log::debug!("inserted item {}", id);
        self.publish(&conn);

        Ok(Item {
            id,
            ..item.clone()
        })
    }

    async fn update(&self, item: &Item) -> DomainResult<()> {
        if !item.is_persisted() {
            return Err(DomainError::InvalidInput(format!(
                "Item '{}' has not been saved yet",
                item.name
            )));
        }
        let conn = self.conn.lock().await;

        let changed = conn.execute(
            "UPDATE items SET name = ?1, bought = ?2 WHERE id = ?3",
            params![item.name, item.bought, item.id()],
        )?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Item {} not found", item.id())));
        }

        log::debug!("updated item {} (bought = {})", item.id(), item.bought);
        self.publish(&conn);
        Ok(())
    }

    async fn delete(&self, item: &Item) -> DomainResult<()> {
        let conn = self.conn.lock().await;

        let changed = conn.execute("DELETE FROM items WHERE id = ?1", params![item.id()])?;
        if changed == 0 {
            log::debug!("item {} already removed", item.id());
            return Ok(());
        }

        log::debug!("deleted item {}", item.id());
        self.publish(&conn);
        Ok(())
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Item>> {
        let conn = self.conn.lock().await;

        let item = conn
            .query_row(
                "SELECT id, name, bought FROM items WHERE id = ?1",
                params![id],
                row_to_item,
            )
            .optional()?;
        Ok(item)
    }

    fn query_unbought(&self) -> ItemStream {
        ItemStream::new(self.unbought.subscribe())
    }
}

fn select_unbought(conn: &Connection) -> DomainResult<Vec<Item>> {
    let mut stmt = conn.prepare_cached(SELECT_UNBOUGHT)?;
    let items = stmt
        .query_map([], row_to_item)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

/// Convert a database row to Item
fn row_to_item(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        name: row.get(1)?,
        bought: row.get(2)?,
    })
}
