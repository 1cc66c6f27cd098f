//! Database Connection and Setup
//!
//! Manages SQLite database connection and migrations.

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult};

/// Path that selects a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Database state wrapper
#[derive(Clone)]
pub struct DbState {
    pub path: PathBuf,
    conn: Arc<Mutex<Connection>>,
}

impl DbState {
    /// Shared handle to the migrated connection
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }
}

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(ref err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                DomainError::Conflict(e.to_string())
            }
            other => DomainError::Internal(other.to_string()),
        }
    }
}

/// Initialize database with path
pub async fn init_db(db_path: &Path) -> DomainResult<DbState> {
    let path = db_path.to_path_buf();
    let open_path = path.clone();

    let conn = tokio::task::spawn_blocking(move || -> DomainResult<Connection> {
        let conn = if open_path.as_os_str() == IN_MEMORY {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = open_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DomainError::Internal(format!("Failed to create db dir: {}", e)))?;
            }
            Connection::open(&open_path)?
        };
        run_migrations(&conn)?;
        Ok(conn)
    })
    .await
    .map_err(|e| DomainError::Internal(format!("DB init task failed: {}", e)))??;

    log::debug!("database ready at {}", path.display());

    Ok(DbState {
        path,
        conn: Arc::new(Mutex::new(conn)),
    })
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> DomainResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (length(trim(name)) > 0),
            bought INTEGER NOT NULL DEFAULT 0
        )",
    )?;

    // Databases created before archiving existed only carry the name column
    if !column_exists(conn, "items", "bought")? {
        conn.execute("ALTER TABLE items ADD COLUMN bought INTEGER NOT NULL DEFAULT 0", [])
            .map_err(|e| DomainError::Internal(format!("Failed to add bought: {}", e)))?;
    }

    // The visible list filters on bought and sorts by id
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_items_bought ON items(bought, id DESC)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_in_memory() {
        let db = init_db(Path::new(IN_MEMORY)).await.expect("init failed");
        let conn = db.connection();
        let conn = conn.lock().await;
        assert!(column_exists(&conn, "items", "name").unwrap());
        assert!(column_exists(&conn, "items", "bought").unwrap());
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("shopping_list.db");

        init_db(&path).await.expect("first init failed");
        let db = init_db(&path).await.expect("second init failed");
        assert_eq!(db.path, path);
    }

    #[tokio::test]
    async fn test_legacy_table_gains_bought_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE items (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL);
                 INSERT INTO items (name) VALUES ('Milk');",
            )
            .unwrap();
        }

        let db = init_db(&path).await.expect("init failed");
        let conn = db.connection();
        let conn = conn.lock().await;
        let bought: bool = conn
            .query_row("SELECT bought FROM items WHERE name = 'Milk'", [], |row| row.get(0))
            .unwrap();
        assert!(!bought);
    }
}
