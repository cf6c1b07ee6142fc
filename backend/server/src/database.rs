//! # Table Store
//!
//! Flat row-oriented table acting as the certificate database.
//!
//! ## Requirements
//!
//! - Whole-table reads, row 0 is the header
//! - Single-row append at the end
//! - Removal of the first data row matching a predicate
//! - No index, no transactions, the directory lock serializes access
//!
//! ## Redis
//!
//! - One Redis list per table: `TABLE_KEY`
//! - Each element is one JSON-encoded row (six text cells)
//! - `LRANGE 0 -1` reads, `RPUSH` appends
//! - Removal overwrites the row's index with a tombstone (`LSET`), then `LREM 1` drops it
//! - Header pushed on startup when the list is empty
//!
//! ## Memory
//!
//! In-process table, used by tests and `STORE_BACKEND=memory`.
use std::time::Duration;

use async_trait::async_trait;
use records::{Row, header_row};
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("corrupt row: {0}")]
    CorruptRow(#[from] serde_json::Error),
}

/// Never a JSON array, so it cannot collide with an encoded row.
const TOMBSTONE: &str = "__removed__";

pub type RowPredicate<'a> = &'a (dyn Fn(&[String]) -> bool + Send + Sync);

#[async_trait]
pub trait TableStore: Send + Sync {
    /// Every row including the header, in insertion order.
    async fn read_all(&self) -> Result<Vec<Row>, StoreError>;

    async fn append(&self, row: Row) -> Result<(), StoreError>;

    /// Removes the first data row accepted by `predicate`. Returns whether one was removed.
    async fn remove_matching(&self, predicate: RowPredicate<'_>) -> Result<bool, StoreError>;
}

pub struct RedisStore {
    connection: ConnectionManager,
    key: String,
}

impl RedisStore {
    pub async fn connect(redis_url: &str, key: &str) -> Result<Self, StoreError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(Duration::from_millis(500));

        let client = Client::open(redis_url)?;
        let connection = client.get_connection_manager_with_config(config).await?;

        let store = Self {
            connection,
            key: key.to_string(),
        };
        store.ensure_header().await?;

        Ok(store)
    }

    async fn ensure_header(&self) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();

        let len: usize = connection.llen(&self.key).await?;
        if len == 0 {
            info!("Table {} is empty, writing header row", self.key);

            let header = serde_json::to_string(&header_row())?;
            let _: () = connection.rpush(&self.key, header).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl TableStore for RedisStore {
    async fn read_all(&self) -> Result<Vec<Row>, StoreError> {
        let mut connection = self.connection.clone();

        let raw: Vec<String> = connection.lrange(&self.key, 0, -1).await?;

        raw.iter()
            .map(|encoded| serde_json::from_str(encoded).map_err(StoreError::from))
            .collect()
    }

    async fn append(&self, row: Row) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();

        let encoded = serde_json::to_string(&row)?;
        let _: () = connection.rpush(&self.key, encoded).await?;

        Ok(())
    }

    async fn remove_matching(&self, predicate: RowPredicate<'_>) -> Result<bool, StoreError> {
        let rows = self.read_all().await?;

        let Some(index) = rows
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, row)| predicate(row.as_slice()))
            .map(|(index, _)| index)
        else {
            return Ok(false);
        };

        // Mark by position, then drop the mark: LREM alone would take an
        // identical header row first.
        let mut connection = self.connection.clone();
        let _: () = connection.lset(&self.key, index as isize, TOMBSTONE).await?;
        let removed: i64 = connection.lrem(&self.key, 1, TOMBSTONE).await?;

        Ok(removed > 0)
    }
}

pub struct MemoryStore {
    rows: RwLock<Vec<Row>>,
}

impl MemoryStore {
    /// Header only.
    pub fn new() -> Self {
        Self::with_rows(Vec::new())
    }

    /// Header followed by `rows`.
    pub fn with_rows(rows: Vec<Row>) -> Self {
        let mut table = vec![header_row()];
        table.extend(rows);

        Self {
            rows: RwLock::new(table),
        }
    }

    /// No header at all, as a freshly created sheet would be.
    pub fn blank() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn read_all(&self) -> Result<Vec<Row>, StoreError> {
        Ok(self.rows.read().await.clone())
    }

    async fn append(&self, row: Row) -> Result<(), StoreError> {
        self.rows.write().await.push(row);

        Ok(())
    }

    async fn remove_matching(&self, predicate: RowPredicate<'_>) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().await;

        let position = rows
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, row)| predicate(row.as_slice()))
            .map(|(index, _)| index);

        match position {
            Some(index) => {
                rows.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
