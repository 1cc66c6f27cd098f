//! Items Repository
//!
//! Forwards the item store's operations in the controller's vocabulary.

use std::sync::Arc;

use crate::domain::{DomainResult, Item};
use super::traits::{ItemStore, ItemStream};

#[derive(Clone)]
pub struct ItemsRepository {
    store: Arc<dyn ItemStore>,
}

impl ItemsRepository {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    pub fn list_unbought(&self) -> ItemStream {
        self.store.query_unbought()
    }

    pub async fn add(&self, item: &Item) -> DomainResult<Item> {
        self.store.insert(item).await
    }

    pub async fn update(&self, item: &Item) -> DomainResult<()> {
        self.store.update(item).await
    }

    pub async fn remove(&self, item: &Item) -> DomainResult<()> {
        self.store.delete(item).await
    }
}
