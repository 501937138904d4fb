//! # Menu Store
//!
//! The read-only menu table behind the ordering webhook.
//!
//! - [`MenuStore`] is the lookup interface the webhook depends on
//! - [`InMemoryMenuStore`] keeps the items in a `Vec`
//! - [`SqliteMenuStore`] reads the `menus` table through sqlx
//!
//! Prices are exact decimals end to end; SQLite stores them as TEXT.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

mod memory;
mod sqlite;

pub use memory::InMemoryMenuStore;
pub use sqlite::SqliteMenuStore;

/// A purchasable entry on the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
}

/// An item to be inserted by seeding; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMenuItem {
    pub name: String,
    pub price: Decimal,
}

impl NewMenuItem {
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

/// The four items a fresh deployment starts with, in id order.
pub fn default_menu() -> Vec<NewMenuItem> {
    vec![
        NewMenuItem::new("Nigerian Jollof Rice and Chicken", Decimal::new(100, 0)),
        NewMenuItem::new("Burger and Coke", Decimal::new(50, 0)),
        NewMenuItem::new("Chicken and Chips", Decimal::new(30, 0)),
        NewMenuItem::new("Ghana Jollof Rice and Water", Decimal::new(5, 0)),
    ]
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing database could not be reached or the query failed
    #[error("menu store unavailable: {0}")]
    Unavailable(String),
    /// A stored price is not a decimal number
    #[error("item {id} has an invalid price {value:?}")]
    InvalidPrice { id: i64, value: String },
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

#[async_trait]
pub trait MenuStore: Send + Sync {
    /// Every item, in primary-key order.
    async fn list_all(&self) -> Result<Vec<MenuItem>, StoreError>;

    /// Items matching `ids`, in the order the ids were requested.
    ///
    /// Unknown ids are skipped, and a repeated id yields its item once.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<MenuItem>, StoreError>;
}

/// Order `items` by the first position of their id in `ids`, dropping repeats.
pub(crate) fn in_request_order(ids: &[i64], items: Vec<MenuItem>) -> Vec<MenuItem> {
    let mut ordered = Vec::with_capacity(items.len());
    for id in ids {
        if ordered.iter().any(|item: &MenuItem| item.id == *id) {
            continue;
        }
        if let Some(item) = items.iter().find(|item| item.id == *id) {
            ordered.push(item.clone());
        }
    }
    ordered
}
