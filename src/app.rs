//! Application Wiring
//!
//! Opens the database and builds the store, repository and controller a
//! presentation layer talks to.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::controller::ItemStateController;
use crate::domain::DomainError;
use crate::repository::{init_db, DbState, ItemsRepository, SqliteItemStore};

#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("logger setup failed: {0}")]
    Logger(#[from] rolling_logger::LoggerError),
    #[error("database setup failed: {0}")]
    Database(#[from] DomainError),
}

/// Application state shared with the presentation layer
pub struct ShoppingList {
    pub db_state: DbState,
    pub db_path: PathBuf,
    repository: ItemsRepository,
    controller: ItemStateController,
}

impl ShoppingList {
    /// Open the database and build the controller. Logging is left to the host.
    pub async fn open(config: &AppConfig) -> Result<Self, DomainError> {
        let db_state = init_db(&config.database_path).await?;
        let store = SqliteItemStore::open(&db_state).await?;
        let repository = ItemsRepository::new(Arc::new(store));
        let controller =
            ItemStateController::with_grace(repository.clone(), config.visible_items_grace());

        log::info!("shopping list opened at {}", db_state.path.display());

        Ok(Self {
            db_path: db_state.path.clone(),
            db_state,
            repository,
            controller,
        })
    }

    pub fn controller(&self) -> &ItemStateController {
        &self.controller
    }

    pub fn repository(&self) -> &ItemsRepository {
        &self.repository
    }
}

/// Initialize logging, then open the shopping list
pub async fn start(config: &AppConfig) -> Result<ShoppingList, StartError> {
    rolling_logger::init_logger_with(&config.log_dir, &config.app_name, config.logger_options())?;

    match ShoppingList::open(config).await {
        Ok(list) => {
            let _ = rolling_logger::info("Database initialized");
            Ok(list)
        }
        Err(e) => {
            let _ = rolling_logger::error(&format!("Database init failed: {}", e));
            Err(e.into())
        }
    }
}
