//! Bucket and entry CRUD operations.
//!
//! A bucket is a named, versioned collection of (request, response) pairs.
//! Exactly one bucket is current at any time; stale buckets are deleted
//! wholesale at activation. Entries are keyed by the full resource URL plus
//! method and written with UPSERT semantics (last write wins).

use super::connection::CacheDb;
use super::hash::compute_entry_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A captured response stored in a cache bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub key: String,
    pub bucket: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers_json: Option<String>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CachedResponse {
    /// Build an entry for the given bucket, computing its storage key.
    pub fn new(
        bucket: &str, method: &str, url: &str, status: u16, content_type: Option<String>,
        headers_json: Option<String>, body: Vec<u8>,
    ) -> Self {
        Self {
            key: compute_entry_key(bucket, method, url),
            bucket: bucket.to_string(),
            method: method.to_string(),
            url: url.to_string(),
            status,
            content_type,
            headers_json,
            body,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl CacheDb {
    /// Create a bucket if it doesn't already exist.
    pub async fn ensure_bucket(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO buckets (name, created_at) VALUES (?1, ?2)
                     ON CONFLICT(name) DO NOTHING",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// List the names of all existing buckets.
    pub async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM buckets ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a bucket and every entry in it.
    ///
    /// Returns true if the bucket existed.
    pub async fn delete_bucket(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM buckets WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or update a single cache entry.
    ///
    /// Uses UPSERT semantics: concurrent writers of the same key race
    /// last-write-wins, which is acceptable because entries are idempotent
    /// representations of the same canonical resource.
    pub async fn put_entry(&self, entry: &CachedResponse) -> Result<(), Error> {
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                upsert_entry(conn, &entry)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Insert a batch of entries in a single transaction.
    ///
    /// Either every entry is written or none is; used by install-time
    /// precaching where a partial bucket must not be considered valid.
    pub async fn put_entries(&self, entries: Vec<CachedResponse>) -> Result<(), Error> {
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                for entry in &entries {
                    upsert_entry(&tx, entry)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up an entry by exact request match.
    ///
    /// Returns None if the bucket holds no entry for this method and URL.
    pub async fn match_entry(&self, bucket: &str, method: &str, url: &str) -> Result<Option<CachedResponse>, Error> {
        let key = compute_entry_key(bucket, method, url);
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, bucket, method, url, status, content_type, headers_json, body, stored_at
                     FROM entries WHERE key = ?1",
                )?;

                let result = stmt.query_row(params![key], |row| {
                    Ok(CachedResponse {
                        key: row.get(0)?,
                        bucket: row.get(1)?,
                        method: row.get(2)?,
                        url: row.get(3)?,
                        status: row.get::<_, i64>(4)? as u16,
                        content_type: row.get(5)?,
                        headers_json: row.get(6)?,
                        body: row.get(7)?,
                        stored_at: row.get(8)?,
                    })
                });

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Count the entries held by a bucket.
    pub async fn count_entries(&self, bucket: &str) -> Result<u64, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE bucket = ?1",
                    params![bucket],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

fn upsert_entry(conn: &rusqlite::Connection, entry: &CachedResponse) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO entries (
            key, bucket, method, url, status, content_type, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(key) DO UPDATE SET
            status = excluded.status,
            content_type = excluded.content_type,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            &entry.key,
            &entry.bucket,
            &entry.method,
            &entry.url,
            entry.status as i64,
            &entry.content_type,
            &entry.headers_json,
            &entry.body,
            &entry.stored_at,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUCKET: &str = "mitsulist-cache-v1";

    fn make_entry(url: &str, body: &[u8]) -> CachedResponse {
        CachedResponse::new(BUCKET, "GET", url, 200, Some("text/html".to_string()), None, body.to_vec())
    }

    async fn open_with_bucket() -> CacheDb {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.ensure_bucket(BUCKET).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = open_with_bucket().await;
        let entry = make_entry("http://localhost:8000/", b"<html>home</html>");

        db.put_entry(&entry).await.unwrap();

        let found = db.match_entry(BUCKET, "GET", "http://localhost:8000/").await.unwrap().unwrap();
        assert_eq!(found.status, 200);
        assert_eq!(found.body, b"<html>home</html>");
    }

    #[tokio::test]
    async fn test_match_missing() {
        let db = open_with_bucket().await;
        let found = db.match_entry(BUCKET, "GET", "http://localhost:8000/never/").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_upsert_last_write_wins() {
        let db = open_with_bucket().await;
        db.put_entry(&make_entry("http://localhost:8000/", b"old")).await.unwrap();
        db.put_entry(&make_entry("http://localhost:8000/", b"new")).await.unwrap();

        let found = db.match_entry(BUCKET, "GET", "http://localhost:8000/").await.unwrap().unwrap();
        assert_eq!(found.body, b"new");
        assert_eq!(db.count_entries(BUCKET).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_put_entries_batch() {
        let db = open_with_bucket().await;
        db.put_entries(vec![
            make_entry("http://localhost:8000/", b"home"),
            make_entry("http://localhost:8000/static/css/index.css", b"body{}"),
        ])
        .await
        .unwrap();

        assert_eq!(db.count_entries(BUCKET).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_bucket_cascades() {
        let db = open_with_bucket().await;
        db.put_entry(&make_entry("http://localhost:8000/", b"home")).await.unwrap();

        let existed = db.delete_bucket(BUCKET).await.unwrap();
        assert!(existed);
        assert_eq!(db.count_entries(BUCKET).await.unwrap(), 0);
        assert!(db.bucket_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_bucket() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let existed = db.delete_bucket("mitsulist-cache-v0").await.unwrap();
        assert!(!existed);
    }

    #[tokio::test]
    async fn test_bucket_names() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.ensure_bucket("mitsulist-cache-v1").await.unwrap();
        db.ensure_bucket("mitsulist-cache-v2").await.unwrap();
        db.ensure_bucket("mitsulist-cache-v1").await.unwrap();

        let names = db.bucket_names().await.unwrap();
        assert_eq!(names, vec!["mitsulist-cache-v1", "mitsulist-cache-v2"]);
    }

    #[tokio::test]
    async fn test_same_url_across_buckets() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.ensure_bucket("mitsulist-cache-v1").await.unwrap();
        db.ensure_bucket("mitsulist-cache-v2").await.unwrap();

        let old = CachedResponse::new("mitsulist-cache-v1", "GET", "http://localhost:8000/", 200, None, None, b"v1".to_vec());
        let new = CachedResponse::new("mitsulist-cache-v2", "GET", "http://localhost:8000/", 200, None, None, b"v2".to_vec());
        db.put_entry(&old).await.unwrap();
        db.put_entry(&new).await.unwrap();

        db.delete_bucket("mitsulist-cache-v1").await.unwrap();

        let survivor = db.match_entry("mitsulist-cache-v2", "GET", "http://localhost:8000/").await.unwrap().unwrap();
        assert_eq!(survivor.body, b"v2");
    }
}
