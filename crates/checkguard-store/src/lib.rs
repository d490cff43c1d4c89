pub mod db;
pub mod error;
pub mod migrate;
pub mod paths;
pub mod repo;

pub use db::PoolOptions;

use crate::db::{SqliteConnectionManager, SqlitePool};
use crate::error::Result;
use r2d2::PooledConnection;
use std::path::Path;

/// Handle to the blocklist database. Cloning shares the same pool.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, &PoolOptions::default())
    }

    pub fn open_with(path: &Path, options: &PoolOptions) -> Result<Self> {
        let pool = db::open(path, options)?;
        Ok(Self { pool })
    }

    pub fn open_in_memory() -> Result<Self> {
        let pool = db::open_in_memory()?;
        Ok(Self { pool })
    }

    pub fn migrate(&self) -> Result<()> {
        let mut conn = self.connection()?;
        migrate::run_migrations(&mut conn)
    }

    pub fn schema_version(&self) -> Result<i64> {
        let conn = self.connection()?;
        migrate::schema_version(&conn)
    }

    /// Checks a connection out of the pool; it returns on drop.
    pub fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    pub fn max_connections(&self) -> u32 {
        self.pool.max_size()
    }

    pub fn blocked_numbers(&self) -> repo::BlockedNumbersRepo<'_> {
        repo::BlockedNumbersRepo::new(&self.pool)
    }
}
