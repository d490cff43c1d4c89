use crate::error::{Result, StoreError};
use r2d2::{ManageConnection, Pool};
use rusqlite::{Connection, OpenFlags};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub type SqlitePool = Pool<SqliteConnectionManager>;

/// Bounds for the shared connection pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    /// Maximum number of simultaneously open connections.
    pub max_connections: u32,
    /// Idle connections kept ready; `None` keeps `max_connections`.
    pub min_idle: Option<u32>,
    /// Connections older than this are closed and replaced.
    pub max_lifetime: Option<Duration>,
    /// How long a caller waits for a free connection.
    pub connection_timeout: Duration,
    /// How long SQLite waits on a locked database before failing a statement.
    pub busy_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_connections: 25,
            min_idle: Some(5),
            max_lifetime: Some(Duration::from_secs(5 * 60)),
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_millis(5_000),
        }
    }
}

#[derive(Debug, Clone)]
enum Source {
    File(PathBuf),
    Memory,
}

/// Opens rusqlite connections for the pool and applies per-connection pragmas.
#[derive(Debug, Clone)]
pub struct SqliteConnectionManager {
    source: Source,
    busy_timeout: Duration,
}

impl SqliteConnectionManager {
    pub fn file(path: &Path, busy_timeout: Duration) -> Self {
        Self {
            source: Source::File(path.to_path_buf()),
            busy_timeout,
        }
    }

    pub fn memory() -> Self {
        Self {
            source: Source::Memory,
            busy_timeout: Duration::from_millis(5_000),
        }
    }
}

impl ManageConnection for SqliteConnectionManager {
    type Connection = Connection;
    type Error = rusqlite::Error;

    fn connect(&self) -> std::result::Result<Connection, rusqlite::Error> {
        let conn = match &self.source {
            Source::File(path) => Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?,
            Source::Memory => Connection::open_in_memory()?,
        };
        apply_pragmas(&conn, self.busy_timeout)?;
        Ok(conn)
    }

    fn is_valid(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.query_row("SELECT 1;", [], |_| Ok(()))
    }

    fn has_broken(&self, _conn: &mut Connection) -> bool {
        false
    }
}

pub fn open(path: &Path, options: &PoolOptions) -> Result<SqlitePool> {
    let min_idle = effective_min_idle(options)?;
    let manager = SqliteConnectionManager::file(path, options.busy_timeout);
    let pool = Pool::builder()
        .max_size(options.max_connections)
        .min_idle(min_idle)
        .max_lifetime(options.max_lifetime)
        .connection_timeout(options.connection_timeout)
        .build(manager)?;
    restrict_db_permissions(path)?;
    Ok(pool)
}

/// Rejects options the pool builder would panic on; `min_idle` is capped at
/// `max_connections`.
fn effective_min_idle(options: &PoolOptions) -> Result<Option<u32>> {
    if options.max_connections == 0 {
        return Err(StoreError::InvalidPoolOptions(
            "max_connections must be at least 1".to_string(),
        ));
    }
    if options.connection_timeout.is_zero() {
        return Err(StoreError::InvalidPoolOptions(
            "connection_timeout must be greater than zero".to_string(),
        ));
    }
    if options.max_lifetime.is_some_and(|lifetime| lifetime.is_zero()) {
        return Err(StoreError::InvalidPoolOptions(
            "max_lifetime must be greater than zero".to_string(),
        ));
    }
    Ok(options
        .min_idle
        .map(|min_idle| min_idle.min(options.max_connections)))
}

/// Single connection that never expires: the database lives as long as the pool.
pub fn open_in_memory() -> Result<SqlitePool> {
    let pool = Pool::builder()
        .max_size(1)
        .min_idle(Some(1))
        .max_lifetime(None)
        .idle_timeout(None)
        .build(SqliteConnectionManager::memory())?;
    Ok(pool)
}

fn apply_pragmas(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.busy_timeout(busy_timeout)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

#[cfg(unix)]
fn restrict_db_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if path.exists() {
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn restrict_db_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
