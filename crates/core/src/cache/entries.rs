//! Entry CRUD operations.
//!
//! Every write replaces the whole entry: the old row is deleted and a new one
//! appended, so a refreshed entry moves to the newest insertion position.

use super::connection::CacheDb;
use super::stores::{ensure_store, find_store};
use crate::{Error, RequestKey, Response, ResponseKind};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Raw columns of one entry row, decoded outside the rusqlite closure.
type EntryRow = (String, i64, String, Vec<u8>, String);

fn decode(row: EntryRow) -> Result<Response, Error> {
    let (url, status, headers_json, body, kind) = row;
    let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
    let kind = kind.parse::<ResponseKind>().map_err(Error::Corrupt)?;
    let status = u16::try_from(status).map_err(|_| Error::Corrupt(format!("status out of range: {status}")))?;
    Ok(Response { url, status, headers, body: body.into(), kind })
}

fn insert_entry(conn: &rusqlite::Connection, store_id: i64, key: &RequestKey, response: &Response) -> Result<(), Error> {
    let key_hash = key.hash();
    let headers_json = serde_json::to_string(&response.headers)?;
    conn.execute("DELETE FROM entries WHERE store_id = ?1 AND key_hash = ?2", params![store_id, key_hash])?;
    conn.execute(
        "INSERT INTO entries (
            store_id, key_hash, method, url, response_url, status, headers_json, body, kind, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            store_id,
            key_hash,
            &key.method,
            &key.url,
            &response.url,
            response.status as i64,
            headers_json,
            response.body.as_ref(),
            response.kind.as_str(),
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Get the entry for a request identity in one store.
    ///
    /// Returns None if the store or the entry doesn't exist.
    pub async fn get_entry(&self, store: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        let store = store.to_string();
        let key_hash = key.hash();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let result = conn.query_row(
                    "SELECT e.response_url, e.status, e.headers_json, e.body, e.kind
                     FROM entries e JOIN stores s ON s.id = e.store_id
                     WHERE s.name = ?1 AND e.key_hash = ?2",
                    params![store, key_hash],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
                );

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(decode).transpose()
    }

    /// Find the entry for a request identity in any store.
    ///
    /// Stores are searched in creation order; the first hit wins.
    pub async fn match_entry(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        let key_hash = key.hash();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let result = conn.query_row(
                    "SELECT response_url, status, headers_json, body, kind
                     FROM entries WHERE key_hash = ?1
                     ORDER BY store_id LIMIT 1",
                    params![key_hash],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
                );

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(decode).transpose()
    }

    /// Insert or replace one entry, creating the store if needed.
    pub async fn put_entry(&self, store: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        let store = store.to_string();
        let key = key.clone();
        let response = response.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                let store_id = ensure_store(&tx, &store)?;
                insert_entry(&tx, store_id, &key, &response)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace many entries in a single transaction.
    ///
    /// Either every entry is committed or none is.
    pub async fn put_entries(&self, store: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        let store = store.to_string();
        let entries = entries.to_vec();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                let store_id = ensure_store(&tx, &store)?;
                for (key, response) in &entries {
                    insert_entry(&tx, store_id, key, response)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete one entry.
    ///
    /// Returns false if nothing was deleted.
    pub async fn delete_entry(&self, store: &str, key: &RequestKey) -> Result<bool, Error> {
        let store = store.to_string();
        let key_hash = key.hash();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let Some(store_id) = find_store(conn, &store)? else {
                    return Ok(false);
                };
                let deleted =
                    conn.execute("DELETE FROM entries WHERE store_id = ?1 AND key_hash = ?2", params![store_id, key_hash])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Request identities of one store in insertion order, oldest first.
    pub async fn entry_keys(&self, store: &str) -> Result<Vec<RequestKey>, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.method, e.url FROM entries e JOIN stores s ON s.id = e.store_id
                     WHERE s.name = ?1 ORDER BY e.seq",
                )?;
                let keys = stmt
                    .query_map(params![store], |row| Ok(RequestKey { method: row.get(0)?, url: row.get(1)? }))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}
