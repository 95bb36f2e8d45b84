//! Entry storage and lookup within a namespace.
//!
//! Entries are response snapshots keyed by request identity. Writes use
//! UPSERT semantics, so the last write for a key wins.

use super::hash::compute_cache_key;
use super::namespaces::Namespace;
use crate::{Error, Request, Response};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

pub(crate) const RESPONSE_COLUMNS: &str = "COALESCE(entries.response_url, entries.url), entries.status, \
     entries.status_text, entries.headers_json, entries.body";

/// Listing metadata for a stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntryMeta {
    pub namespace: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    /// Body size in bytes.
    pub size: u64,
    pub stored_at: String,
}

/// Raw row as read from SQLite, before headers are decoded.
pub(crate) struct StoredRow {
    url: String,
    status: u16,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
}

impl StoredRow {
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            url: row.get(0)?,
            status: row.get(1)?,
            status_text: row.get(2)?,
            headers_json: row.get(3)?,
            body: row.get(4)?,
        })
    }

    pub(crate) fn into_response(self) -> Result<Response, Error> {
        let headers: Vec<(String, String)> = serde_json::from_str(&self.headers_json)?;
        Ok(Response {
            url: self.url,
            status: self.status,
            status_text: self.status_text,
            headers,
            body: self.body.into(),
        })
    }
}

/// A prepared row for insertion.
struct NewEntry {
    key_hash: String,
    method: String,
    url: String,
    response_url: String,
    status: u16,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
}

impl NewEntry {
    fn prepare(request: &Request, response: &Response) -> Result<Self, Error> {
        if !request.is_get() {
            return Err(Error::InvalidInput(format!("only GET requests can be cached, got {}", request.method)));
        }

        let url = request.cache_url();
        Ok(Self {
            key_hash: compute_cache_key(&request.method, &url),
            method: request.method.clone(),
            url,
            response_url: response.url.clone(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers_json: serde_json::to_string(&response.headers)?,
            body: response.body.to_vec(),
        })
    }
}

fn insert_entries(conn: &mut rusqlite::Connection, namespace: &str, rows: &[NewEntry]) -> Result<(), Error> {
    let now = chrono::Utc::now().to_rfc3339();
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT OR IGNORE INTO namespaces (name, created_at) VALUES (?1, ?2)",
        params![namespace, now],
    )?;
    for row in rows {
        tx.execute(
            "INSERT INTO entries (
                namespace, key_hash, method, url, response_url, status, status_text, headers_json, body, stored_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(namespace, key_hash) DO UPDATE SET
                method = excluded.method,
                url = excluded.url,
                response_url = excluded.response_url,
                status = excluded.status,
                status_text = excluded.status_text,
                headers_json = excluded.headers_json,
                body = excluded.body,
                stored_at = excluded.stored_at",
            params![
                namespace,
                &row.key_hash,
                &row.method,
                &row.url,
                &row.response_url,
                row.status,
                &row.status_text,
                &row.headers_json,
                &row.body,
                now,
            ],
        )?;
    }
    tx.commit()?;
    Ok(())
}

impl Namespace {
    /// Store a response snapshot for a request.
    ///
    /// Only GET requests can be stored.
    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        let row = NewEntry::prepare(request, response)?;
        let namespace = self.name.clone();
        self.db
            .conn
            .call(move |conn| insert_entries(conn, &namespace, &[row]))
            .await
            .map_err(Error::from)
    }

    /// Store several snapshots in one transaction: either all land or none do.
    pub async fn put_all(&self, pairs: &[(Request, Response)]) -> Result<(), Error> {
        let rows = pairs
            .iter()
            .map(|(request, response)| NewEntry::prepare(request, response))
            .collect::<Result<Vec<_>, _>>()?;
        let namespace = self.name.clone();
        self.db
            .conn
            .call(move |conn| insert_entries(conn, &namespace, &rows))
            .await
            .map_err(Error::from)
    }

    /// Look a request up in this namespace only.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }

        let key_hash = compute_cache_key(&request.method, &request.cache_url());
        let namespace = self.name.clone();
        let sql = format!("SELECT {RESPONSE_COLUMNS} FROM entries WHERE namespace = ?1 AND key_hash = ?2");
        self.db
            .conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let mut stmt = conn.prepare(&sql)?;
                match stmt.query_row(params![namespace, key_hash], StoredRow::from_row) {
                    Ok(row) => Ok(Some(row.into_response()?)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// List the entries in this namespace, ordered by URL.
    pub async fn keys(&self) -> Result<Vec<EntryMeta>, Error> {
        let namespace = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<EntryMeta>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT namespace, method, url, status, length(body), stored_at
                     FROM entries WHERE namespace = ?1 ORDER BY url ASC",
                )?;
                let entries = stmt
                    .query_map(params![namespace], |row| {
                        Ok(EntryMeta {
                            namespace: row.get(0)?,
                            method: row.get(1)?,
                            url: row.get(2)?,
                            status: row.get(3)?,
                            size: row.get(4)?,
                            stored_at: row.get(5)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                Ok(entries)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in this namespace.
    pub async fn len(&self) -> Result<usize, Error> {
        let namespace = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE namespace = ?1", params![namespace], |row| {
                        row.get(0)
                    })?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }
}
