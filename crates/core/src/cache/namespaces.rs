//! Namespace management.
//!
//! A namespace is a named store of request/response pairs. The worker keeps
//! one versioned static namespace and one runtime namespace alive; any other
//! name is stale once a new release activates.

use super::connection::CacheDb;
use super::entries::{RESPONSE_COLUMNS, StoredRow};
use super::hash::compute_cache_key;
use crate::{Error, Request, Response};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Handle to a single named namespace.
///
/// Obtained from [`CacheDb::open_namespace`]. Holding a handle does not keep
/// the namespace alive; writes through a handle whose namespace was deleted
/// recreate it.
#[derive(Clone, Debug)]
pub struct Namespace {
    pub(crate) db: CacheDb,
    pub(crate) name: String,
}

impl Namespace {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl CacheDb {
    /// Handle to a namespace without creating it; the first write creates it.
    pub fn namespace(&self, name: &str) -> Namespace {
        Namespace { db: self.clone(), name: name.to_string() }
    }

    /// Open a namespace, creating it if it doesn't exist.
    pub async fn open_namespace(&self, name: &str) -> Result<Namespace, Error> {
        if name.is_empty() {
            return Err(Error::InvalidInput("namespace name cannot be empty".into()));
        }

        let owned = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO namespaces (name, created_at) VALUES (?1, ?2)",
                    params![owned, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(Namespace { db: self.clone(), name: name.to_string() })
    }

    /// Check whether a namespace exists.
    pub async fn has_namespace(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM namespaces WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// All namespace names, in creation order.
    pub async fn namespace_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM namespaces ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, rusqlite::Error>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a namespace and every entry in it.
    ///
    /// Returns false if the namespace didn't exist.
    pub async fn delete_namespace(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM namespaces WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Look a request up in every namespace, oldest namespace first.
    ///
    /// Only GET requests can match. Returns None on a miss.
    pub async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }

        let key_hash = compute_cache_key(&request.method, &request.cache_url());
        let sql = format!(
            "SELECT {RESPONSE_COLUMNS} FROM entries
             JOIN namespaces ON namespaces.name = entries.namespace
             WHERE entries.key_hash = ?1
             ORDER BY namespaces.rowid ASC
             LIMIT 1"
        );
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let mut stmt = conn.prepare(&sql)?;
                match stmt.query_row(params![key_hash], StoredRow::from_row) {
                    Ok(row) => Ok(Some(row.into_response()?)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn get(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_open_creates_once() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_namespace("static-v1").await.unwrap();
        db.open_namespace("static-v1").await.unwrap();

        assert!(db.has_namespace("static-v1").await.unwrap());
        assert_eq!(db.namespace_names().await.unwrap(), vec!["static-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_open_empty_name() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.open_namespace("").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_names_in_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_namespace("zeta").await.unwrap();
        db.open_namespace("alpha").await.unwrap();

        assert_eq!(db.namespace_names().await.unwrap(), vec!["zeta".to_string(), "alpha".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_cascades_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let ns = db.open_namespace("old").await.unwrap();
        let req = get("https://example.com/app.js");
        ns.put(&req, &Response::new("https://example.com/app.js", 200, "js"))
            .await
            .unwrap();

        assert!(db.delete_namespace("old").await.unwrap());
        assert!(!db.delete_namespace("old").await.unwrap());
        assert!(!db.has_namespace("old").await.unwrap());
        assert!(db.match_any(&req).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_match_any_prefers_oldest_namespace() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let first = db.open_namespace("first").await.unwrap();
        let second = db.open_namespace("second").await.unwrap();
        let req = get("https://example.com/");

        second
            .put(&req, &Response::new("https://example.com/", 200, "second"))
            .await
            .unwrap();
        first
            .put(&req, &Response::new("https://example.com/", 200, "first"))
            .await
            .unwrap();

        let found = db.match_any(&req).await.unwrap().unwrap();
        assert_eq!(&found.body[..], b"first");
    }

    #[tokio::test]
    async fn test_match_any_ignores_fragment_and_non_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let ns = db.open_namespace("runtime").await.unwrap();
        ns.put(&get("https://example.com/page"), &Response::new("https://example.com/page", 200, "page"))
            .await
            .unwrap();

        assert!(db.match_any(&get("https://example.com/page#intro")).await.unwrap().is_some());

        let post = Request::new("POST", Url::parse("https://example.com/page").unwrap());
        assert!(db.match_any(&post).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_match_any_miss() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.match_any(&get("https://example.com/nothing")).await.unwrap().is_none());
    }
}
