use async_trait::async_trait;

use crate::{default_menu, in_request_order, MenuItem, MenuStore, StoreError};

/// Menu held in memory. Used by tests and by deployments without a database.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMenuStore {
    items: Vec<MenuItem>,
}

impl InMemoryMenuStore {
    /// Items are kept sorted by id so listing matches primary-key order.
    pub fn new(mut items: Vec<MenuItem>) -> Self {
        items.sort_by_key(|item| item.id);
        Self { items }
    }

    /// The default menu with ids 1..=4.
    pub fn with_default_menu() -> Self {
        let items = default_menu()
            .into_iter()
            .zip(1..)
            .map(|(new, id)| MenuItem {
                id,
                name: new.name,
                price: new.price,
            })
            .collect();
        Self::new(items)
    }
}

#[async_trait]
impl MenuStore for InMemoryMenuStore {
    async fn list_all(&self) -> Result<Vec<MenuItem>, StoreError> {
        Ok(self.items.clone())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<MenuItem>, StoreError> {
        Ok(in_request_order(ids, self.items.clone()))
    }
}
