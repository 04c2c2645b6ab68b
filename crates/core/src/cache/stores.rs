//! Named store operations.
//!
//! Stores are created on first open and ordered by creation. Dropping a
//! store cascades to its entries.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Summary of one store, as listed by hosts and the maintenance CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StoreInfo {
    pub name: String,
    pub entries: u64,
    pub created_at: String,
}

/// Look up a store id, creating the store when absent.
pub(crate) fn ensure_store(conn: &rusqlite::Connection, name: &str) -> Result<i64, Error> {
    conn.execute(
        "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
        params![name, chrono::Utc::now().to_rfc3339()],
    )?;
    let id = conn.query_row("SELECT id FROM stores WHERE name = ?1", params![name], |row| row.get(0))?;
    Ok(id)
}

/// Look up a store id without creating it.
pub(crate) fn find_store(conn: &rusqlite::Connection, name: &str) -> Result<Option<i64>, Error> {
    match conn.query_row("SELECT id FROM stores WHERE name = ?1", params![name], |row| row.get(0)) {
        Ok(id) => Ok(Some(id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl CacheDb {
    /// Open a store by name, creating it if absent. Idempotent.
    pub async fn open_store(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_store(conn, &name)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Names of all stores in creation order.
    pub async fn list_stores(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY id")?;
                let names = stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Stores with their entry counts, in creation order.
    pub async fn store_info(&self) -> Result<Vec<StoreInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<StoreInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT s.name, COUNT(e.seq), s.created_at
                     FROM stores s LEFT JOIN entries e ON e.store_id = s.id
                     GROUP BY s.id ORDER BY s.id",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok(StoreInfo { name: row.get(0)?, entries: row.get::<_, i64>(1)? as u64, created_at: row.get(2)? })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and all of its entries.
    ///
    /// Returns false if no store had that name.
    pub async fn drop_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}
