//! Entry operations on a single named store.
//!
//! Entries are ordered by an insertion sequence. Every `put`, including an
//! overwrite, moves the entry to the newest position; lookups never reorder.

use super::connection::CacheDb;
use super::entry::{RequestKey, ResponseSnapshot, ResponseType};
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Handle to one named store.
#[derive(Clone, Debug)]
pub struct Store {
    db: CacheDb,
    name: String,
}

impl Store {
    pub(crate) fn new(db: CacheDb, name: String) -> Self {
        Self { db, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up the stored response for `key`.
    ///
    /// Returns None if the key (or the whole store) doesn't exist.
    pub async fn lookup(&self, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        let store = self.name.clone();
        let key_hash = key.hash();
        self.db
            .conn
            .call(move |conn| -> Result<Option<ResponseSnapshot>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT final_url, status, status_text, response_type, headers_json, body
                     FROM entries WHERE store = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![store, key_hash], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u16>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Vec<u8>>(5)?,
                    ))
                });

                match result {
                    Ok((url, status, status_text, response_type, headers_json, body)) => Ok(Some(ResponseSnapshot {
                        url,
                        status,
                        status_text,
                        headers: serde_json::from_str(&headers_json)?,
                        body,
                        response_type: response_type.parse::<ResponseType>()?,
                    })),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or overwrite the entry for `key`.
    ///
    /// Creates the store if needed. Last write wins; the written entry
    /// becomes the newest by insertion order.
    pub async fn put(&self, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        let store = self.name.clone();
        let key_hash = key.hash();
        let method = key.method().to_string();
        let url = key.url().to_string();
        let response = response.clone();
        let headers_json = serde_json::to_string(&response.headers)?;
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![store, now],
                )?;
                tx.execute(
                    "INSERT INTO entries (
                        store, key_hash, method, url, final_url, status, status_text,
                        response_type, headers_json, body, seq, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                              (SELECT COALESCE(MAX(seq), 0) + 1 FROM entries), ?11)
                    ON CONFLICT(store, key_hash) DO UPDATE SET
                        final_url = excluded.final_url,
                        status = excluded.status,
                        status_text = excluded.status_text,
                        response_type = excluded.response_type,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        seq = excluded.seq,
                        stored_at = excluded.stored_at",
                    params![
                        store,
                        key_hash,
                        method,
                        url,
                        &response.url,
                        response.status,
                        &response.status_text,
                        response.response_type.as_str(),
                        headers_json,
                        &response.body,
                        now,
                    ],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the entry for `key`.
    ///
    /// Returns whether an entry was removed.
    pub async fn delete(&self, key: &RequestKey) -> Result<bool, Error> {
        let store = self.name.clone();
        let key_hash = key.hash();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE store = ?1 AND key_hash = ?2",
                    params![store, key_hash],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Keys in insertion order, oldest first.
    pub async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        let store = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt = conn.prepare("SELECT method, url FROM entries WHERE store = ?1 ORDER BY seq ASC")?;
                let keys = stmt
                    .query_map(params![store], |row| {
                        Ok(RequestKey::from_columns(row.get(0)?, row.get(1)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in the store.
    pub async fn len(&self) -> Result<usize, Error> {
        let store = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE store = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }

    /// Evict the oldest-inserted entries until at most `max_entries` remain.
    ///
    /// Returns the number of evicted entries.
    pub async fn trim(&self, max_entries: usize) -> Result<u64, Error> {
        let store = self.name.clone();
        let max = i64::try_from(max_entries).unwrap_or(i64::MAX);
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE store = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                if count <= max {
                    return Ok(0);
                }

                let to_delete = count - max;
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE store = ?1 AND key_hash IN (
                        SELECT key_hash FROM entries WHERE store = ?1 ORDER BY seq ASC LIMIT ?2
                    )",
                    params![store, to_delete],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn key(path: &str) -> RequestKey {
        RequestKey::get(&Url::parse(&format!("https://samvidhan.example{path}")).unwrap())
    }

    fn response(path: &str, body: &str) -> ResponseSnapshot {
        ResponseSnapshot::new(format!("https://samvidhan.example{path}"), 200, body.as_bytes().to_vec())
            .with_header("content-type", "text/plain")
    }

    #[tokio::test]
    async fn test_put_and_lookup() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("app-static-v1").await.unwrap();

        store.put(&key("/style.css"), &response("/style.css", "body{}")).await.unwrap();

        let hit = store.lookup(&key("/style.css")).await.unwrap().unwrap();
        assert_eq!(hit.body, b"body{}");
        assert_eq!(hit.status, 200);
        assert_eq!(hit.content_type(), Some("text/plain"));
        assert_eq!(hit.response_type, ResponseType::Basic);
    }

    #[tokio::test]
    async fn test_lookup_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.store("app-static-v1");
        assert!(store.lookup(&key("/nope")).await.unwrap().is_none());
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.store("app-dynamic-v1");

        store.put(&key("/index.html"), &response("/index.html", "old")).await.unwrap();
        store.put(&key("/index.html"), &response("/index.html", "new")).await.unwrap();

        let hit = store.lookup(&key("/index.html")).await.unwrap().unwrap();
        assert_eq!(hit.body, b"new");
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_put_creates_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.store("app-fonts-v1");
        store.put(&key("/a"), &response("/a", "a")).await.unwrap();
        assert!(db.store_exists("app-fonts-v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_stores_are_isolated() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let first = db.store("app-static-v1");
        let second = db.store("app-static-v2");

        first.put(&key("/a"), &response("/a", "v1")).await.unwrap();
        assert!(second.lookup(&key("/a")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.store("app-dynamic-v1");
        store.put(&key("/a"), &response("/a", "a")).await.unwrap();

        assert!(store.delete(&key("/a")).await.unwrap());
        assert!(!store.delete(&key("/a")).await.unwrap());
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_keys_in_insertion_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.store("app-dynamic-v1");
        for path in ["/c", "/a", "/b"] {
            store.put(&key(path), &response(path, path)).await.unwrap();
        }

        let keys: Vec<String> = store.keys().await.unwrap().iter().map(|k| k.url().to_string()).collect();
        assert_eq!(
            keys,
            vec!["https://samvidhan.example/c", "https://samvidhan.example/a", "https://samvidhan.example/b"]
        );
    }

    #[tokio::test]
    async fn test_trim_keeps_newest() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.store("app-dynamic-v1");
        for path in ["/A", "/B", "/C"] {
            store.put(&key(path), &response(path, path)).await.unwrap();
        }

        let evicted = store.trim(2).await.unwrap();
        assert_eq!(evicted, 1);
        assert!(store.lookup(&key("/A")).await.unwrap().is_none());
        assert!(store.lookup(&key("/B")).await.unwrap().is_some());
        assert!(store.lookup(&key("/C")).await.unwrap().is_some());
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_trim_ignores_access_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.store("app-dynamic-v1");
        for path in ["/A", "/B", "/C"] {
            store.put(&key(path), &response(path, path)).await.unwrap();
        }
        store.lookup(&key("/A")).await.unwrap();

        store.trim(2).await.unwrap();
        assert!(store.lookup(&key("/A")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_refreshes_insertion_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.store("app-dynamic-v1");
        for path in ["/A", "/B", "/C"] {
            store.put(&key(path), &response(path, path)).await.unwrap();
        }
        store.put(&key("/A"), &response("/A", "again")).await.unwrap();

        store.trim(2).await.unwrap();
        assert!(store.lookup(&key("/A")).await.unwrap().is_some());
        assert!(store.lookup(&key("/B")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_trim_under_bound_is_noop() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.store("app-dynamic-v1");
        store.put(&key("/A"), &response("/A", "a")).await.unwrap();
        assert_eq!(store.trim(5).await.unwrap(), 0);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_trim_is_per_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let dynamic = db.store("app-dynamic-v1");
        let fonts = db.store("app-fonts-v1");
        for path in ["/A", "/B"] {
            dynamic.put(&key(path), &response(path, path)).await.unwrap();
            fonts.put(&key(path), &response(path, path)).await.unwrap();
        }

        dynamic.trim(1).await.unwrap();
        assert_eq!(dynamic.len().await.unwrap(), 1);
        assert_eq!(fonts.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_store_cascades_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.store("app-v1");
        store.put(&key("/A"), &response("/A", "a")).await.unwrap();

        db.delete_store("app-v1").await.unwrap();
        assert!(store.lookup(&key("/A")).await.unwrap().is_none());
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_trim_with_huge_bound_keeps_everything() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.store("app-dynamic-v1");
        for path in ["/a", "/b", "/c"] {
            store.put(&key(path), &response(path, path)).await.unwrap();
        }

        assert_eq!(store.trim(usize::MAX).await.unwrap(), 0);
        assert_eq!(store.len().await.unwrap(), 3);
    }
}
