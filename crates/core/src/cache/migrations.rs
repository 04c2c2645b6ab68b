//! Schema migrations for the store database.
//!
//! The applied version lives in SQLite's `user_version` pragma. Each
//! migration runs in its own transaction together with the version bump.

use super::Error;
use tokio_rusqlite::{Connection, rusqlite};

struct Migration {
    version: i64,
    sql: &'static str,
}

/// Applied in ascending version order.
const MIGRATIONS: &[Migration] = &[
    Migration { version: 1, sql: include_str!("../../migrations/001_stores.sql") },
    Migration { version: 2, sql: include_str!("../../migrations/002_entries.sql") },
];

/// Latest schema version this build knows about.
pub const SCHEMA_VERSION: i64 = 2;

fn apply_pending(conn: &mut rusqlite::Connection) -> Result<i64, Error> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if current > SCHEMA_VERSION {
        return Err(Error::MigrationFailed(format!(
            "database schema {current} is newer than supported schema {SCHEMA_VERSION}"
        )));
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql)
            .map_err(|e| Error::MigrationFailed(format!("{}: {e}", migration.version)))?;
        tx.pragma_update(None, "user_version", migration.version)?;
        tx.commit()?;
        tracing::debug!(version = migration.version, "applied store schema migration");
    }

    Ok(current)
}

/// Bring the schema up to [`SCHEMA_VERSION`].
///
/// # Errors
///
/// Fails if a migration does not apply, or if the database was written by
/// a newer schema.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    let previous = conn.call(apply_pending).await?;
    if previous < SCHEMA_VERSION {
        tracing::info!(from = previous, to = SCHEMA_VERSION, "store schema migrated");
    }
    Ok(())
}
