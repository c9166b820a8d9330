//! SQLite implementation of the RecordStore trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking. The database is
//! opened once and the connection shared behind a mutex.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{PutResult, RecordStore};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| StoreError::LockPoisoned(format!("mutex poisoned: {}", e)))
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get_record(&self, name: &str) -> Result<Option<Bytes>> {
        let name = name.to_string();

        self.with_conn(move |conn| {
            let value: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT value FROM kv_records WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value.map(Bytes::from))
        })
        .await
    }

    async fn put_record_if_absent(&self, name: &str, value: Bytes) -> Result<PutResult> {
        let name = name.to_string();

        self.with_conn(move |conn| {
            // IMMEDIATE takes the write lock up front so another process
            // cannot slip a row in between the insert and the read-back.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let inserted = tx.execute(
                "INSERT INTO kv_records (name, value, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO NOTHING",
                params![name, value.as_ref(), crate::now_millis()],
            )?;

            let result = if inserted == 1 {
                PutResult::Inserted
            } else {
                let existing: Vec<u8> = tx.query_row(
                    "SELECT value FROM kv_records WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )?;
                PutResult::AlreadyExists {
                    existing: Bytes::from(existing),
                }
            };

            tx.commit()?;
            Ok(result)
        })
        .await
    }
}
