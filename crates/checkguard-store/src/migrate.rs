use crate::error::{Result, StoreError};
use rusqlite::{Connection, TransactionBehavior};

struct Migration {
    name: &'static str,
    sql: &'static str,
}

/// Applied in order; the schema version is the count applied so far.
const MIGRATIONS: &[Migration] = &[Migration {
    name: "001_init.sql",
    sql: include_str!("../migrations/001_init.sql"),
}];

pub fn latest_version() -> i64 {
    MIGRATIONS.len() as i64
}

/// Brings the schema up to [`latest_version`]. The version lives in SQLite's
/// `user_version` header field and is bumped in the same transaction as the
/// migrations, so a failed run leaves the database untouched.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let current = schema_version(&tx)?;
    let latest = latest_version();
    if current > latest {
        return Err(StoreError::Migration(format!(
            "database schema version {current} is newer than this build ({latest})"
        )));
    }

    let pending = MIGRATIONS.iter().skip(usize::try_from(current).unwrap_or(0));
    for migration in pending {
        tx.execute_batch(migration.sql)
            .map_err(|err| StoreError::Migration(format!("{}: {err}", migration.name)))?;
    }
    if current < latest {
        tx.pragma_update(None, "user_version", latest)?;
    }

    tx.commit()?;
    Ok(())
}

pub fn schema_version(conn: &Connection) -> Result<i64> {
    let version = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}
