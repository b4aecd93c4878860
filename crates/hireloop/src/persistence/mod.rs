//! Persistence gateway: the single owner of the connection pool.
//!
//! Repositories receive a cloned [`Database`] at construction time and open their own units of
//! work through it. Dropping a [`Transaction`] before `commit` rolls it back, so a cancelled
//! request never leaves a transaction open.
//!
//! Every mutating unit of work starts with `BEGIN IMMEDIATE`. A deferred transaction that reads
//! before it writes cannot upgrade its lock while another writer is active, and SQLite fails that
//! upgrade with `SQLITE_BUSY` without consulting the busy timeout. Taking the write lock up front
//! makes concurrent writers queue on the busy timeout instead.

use std::str::FromStr;

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info};

use crate::config::DatabaseConfig;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Failures raised while opening or migrating the store.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("unable to open database: {0}")]
    Connect(#[from] sqlx::Error),
    #[error("unable to apply migrations: {0}")]
    Migrate(#[from] MigrateError),
}

/// Injected handle to the relational store. Cloning shares the underlying pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, PersistenceError> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(config.acquire_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;

        info!(max_connections = config.max_connections, "database pool ready");
        Ok(Self { pool })
    }

    /// Private, migrated in-memory store. Backed by a single long-lived connection so the
    /// database survives for as long as the handle does.
    pub async fn in_memory() -> Result<Self, PersistenceError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let database = Self { pool };
        database.migrate().await?;
        Ok(database)
    }

    pub async fn migrate(&self) -> Result<(), PersistenceError> {
        MIGRATOR.run(&self.pool).await?;
        debug!("migrations applied");
        Ok(())
    }

    /// Opens a write unit of work holding the database write lock from its first statement.
    pub async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin_with("BEGIN IMMEDIATE").await
    }

    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, sqlx::Error> {
        self.pool.acquire().await
    }

    /// Cheap round trip used by readiness probes.
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
