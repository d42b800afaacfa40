//! Connection pool bootstrap for SQLite.
//!
//! # Responsibility
//! - Build file-backed or in-memory `r2d2` pools over `rusqlite`.
//! - Configure connection pragmas required by the booking store.
//! - Trigger schema migrations before returning a usable pool.
//!
//! # Invariants
//! - Every pooled connection has `foreign_keys=ON` and a busy timeout equal
//!   to the configured call timeout.
//! - Returned pools have migrations fully applied.
//! - In-memory pools hold exactly one connection, since every SQLite memory
//!   connection is its own database.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Shared pool handle. Cheap to clone; hand it to repository constructors.
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// One connection checked out of a [`ConnectionPool`].
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Pool sizing and per-call deadline settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of pooled connections (file-backed pools only).
    pub pool_size: u32,
    /// Upper bound for pool checkout and for SQLite lock waits.
    pub call_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_size: 8,
            call_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout: Duration,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(())
    }
}

/// Opens a file-backed pool and applies all pending migrations.
///
/// # Side effects
/// - Creates the database file when missing.
/// - Emits `db_open` logging events with duration and status.
pub fn open_pool(path: impl AsRef<Path>, config: &PoolConfig) -> DbResult<ConnectionPool> {
    let manager = SqliteConnectionManager::file(path.as_ref());
    let builder = Pool::builder()
        .max_size(config.pool_size.max(1))
        .connection_timeout(config.call_timeout);
    build_pool(builder, manager, config, "file")
}

/// Opens a single-connection in-memory pool and applies all migrations.
///
/// `config.pool_size` is ignored; the connection never expires so the
/// database lives as long as the pool.
pub fn open_pool_in_memory(config: &PoolConfig) -> DbResult<ConnectionPool> {
    let manager = SqliteConnectionManager::memory();
    let builder = Pool::builder()
        .max_size(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connection_timeout(config.call_timeout);
    build_pool(builder, manager, config, "memory")
}

fn build_pool(
    builder: r2d2::Builder<SqliteConnectionManager>,
    manager: SqliteConnectionManager,
    config: &PoolConfig,
    mode: &'static str,
) -> DbResult<ConnectionPool> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let pool = builder
        .connection_customizer(Box::new(PragmaCustomizer {
            busy_timeout: config.call_timeout,
        }))
        .build(manager)
        .map_err(|err| {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={err}",
                started_at.elapsed().as_millis()
            );
            DbError::from(err)
        })?;

    match bootstrap_pool(&pool) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={} pool_size={}",
                started_at.elapsed().as_millis(),
                pool.max_size()
            );
            Ok(pool)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={err}",
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}

fn bootstrap_pool(pool: &ConnectionPool) -> DbResult<()> {
    let mut conn = pool.get()?;
    apply_migrations(&mut conn)
}
