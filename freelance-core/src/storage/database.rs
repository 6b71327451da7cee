use crate::common::error::{MarketError, Result};
use crate::storage::entity::Entity;
use crate::storage::repository::SqlRepository;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Shared SQLite connection. Locked per call, never across an await.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        info!("Opening SQLite database at {}", path.display());
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Applies the embedded schema. Safe to run repeatedly.
    pub fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");
        let schema = include_str!("../../migrations/001_initial_schema.sql");
        self.with_conn(|conn| {
            conn.execute_batch(schema).map_err(|e| MarketError::Database {
                message: format!("Failed to run initial migration: {e}"),
            })
        })?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    pub fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut guard = self.conn.lock().map_err(|_| MarketError::Poisoned)?;
        f(&mut guard)
    }

    /// Runs `f` in a transaction committed only when it returns `Ok`.
    pub fn transaction<T>(&self, f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T>) -> Result<T> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        })
    }

    pub fn repo<E: Entity>(&self) -> SqlRepository<E> {
        SqlRepository::new(self.clone())
    }
}
