use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::sqlite::{Sqlite, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::{in_request_order, MenuItem, MenuStore, NewMenuItem, StoreError};

const CREATE_MENUS: &str = "CREATE TABLE IF NOT EXISTS menus (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    price TEXT NOT NULL
)";

/// Bound parameters per `IN (...)` lookup, well below SQLite's variable limit.
const MAX_IDS_PER_QUERY: usize = 500;

#[derive(Debug, FromRow)]
struct MenuRow {
    id: i64,
    name: String,
    price: String,
}

impl TryFrom<MenuRow> for MenuItem {
    type Error = StoreError;

    fn try_from(row: MenuRow) -> Result<Self, Self::Error> {
        let price = row
            .price
            .trim()
            .parse::<Decimal>()
            .map_err(|_| StoreError::InvalidPrice {
                id: row.id,
                value: row.price.clone(),
            })?;
        Ok(MenuItem {
            id: row.id,
            name: row.name,
            price,
        })
    }
}

/// Menu backed by the `menus` table of a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteMenuStore {
    pool: SqlitePool,
}

impl SqliteMenuStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for `url`, e.g. `sqlite://menu.db?mode=rwc` or `sqlite::memory:`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let mut options = SqlitePoolOptions::new().max_connections(max_connections.max(1));
        if url.contains(":memory:") {
            // Every connection to :memory: is a separate database; keep exactly one alive.
            options = options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = options.connect(url).await?;
        debug!(url, "connected to menu database");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the `menus` table if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_MENUS).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert `items` in order. Returns how many rows were written.
    pub async fn insert_items(&self, items: &[NewMenuItem]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for item in items {
            written += sqlx::query("INSERT INTO menus (name, price) VALUES (?, ?)")
                .bind(&item.name)
                .bind(item.price.to_string())
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;
        Ok(written)
    }

    /// Seed `items` only when the table is empty, so restarts do not duplicate the menu.
    pub async fn seed(&self, items: &[NewMenuItem]) -> Result<u64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM menus")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            debug!(count, "menu already seeded");
            return Ok(0);
        }
        let written = self.insert_items(items).await?;
        info!(items = written, "seeded menu");
        Ok(written)
    }

    /// [`Self::seed`] with the default four-item menu.
    pub async fn seed_default_menu(&self) -> Result<u64, StoreError> {
        self.seed(&crate::default_menu()).await
    }
}

#[async_trait]
impl MenuStore for SqliteMenuStore {
    async fn list_all(&self) -> Result<Vec<MenuItem>, StoreError> {
        let rows: Vec<MenuRow> = sqlx::query_as("SELECT id, name, price FROM menus ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(MenuItem::try_from).collect()
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<MenuItem>, StoreError> {
        let mut seen = HashSet::with_capacity(ids.len());
        let unique: Vec<i64> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let mut items = Vec::new();
        for chunk in unique.chunks(MAX_IDS_PER_QUERY) {
            let mut query =
                QueryBuilder::<Sqlite>::new("SELECT id, name, price FROM menus WHERE id IN (");
            let mut separated = query.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");

            let rows: Vec<MenuRow> = query.build_query_as().fetch_all(&self.pool).await?;
            for row in rows {
                items.push(MenuItem::try_from(row)?);
            }
        }
        Ok(in_request_order(&unique, items))
    }
}
