//! Entry operations.
//!
//! Stored responses are keyed by `(namespace, request_key)`. Only `GET`
//! requests are stored; lookups for other methods always miss.

use super::connection::CacheDb;
use super::hash::request_key;
use crate::Error;
use crate::http::{Request, Response};
use bytes::Bytes;
use chrono::Utc;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension, Row};
use url::Url;

const SELECT_COLUMNS: &str = "e.status, e.response_type, e.response_url, e.headers_json, e.body";

/// Raw column values of a stored entry, decoded outside the row callback.
struct EntryRow {
    status: i64,
    response_type: String,
    response_url: Option<String>,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            status: row.get(0)?,
            response_type: row.get(1)?,
            response_url: row.get(2)?,
            headers_json: row.get(3)?,
            body: row.get(4)?,
        })
    }

    fn into_response(self) -> Result<Response, Error> {
        let status = u16::try_from(self.status).map_err(|_| Error::CorruptEntry(format!("status {}", self.status)))?;
        let headers: Vec<(String, String)> =
            serde_json::from_str(&self.headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let url = self
            .response_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|e| Error::CorruptEntry(e.to_string()))?;

        Ok(Response { status, headers, body: Bytes::from(self.body), kind: self.response_type.parse()?, url })
    }
}

impl CacheDb {
    /// Insert or replace the entry for `request` in `namespace`.
    ///
    /// Creates the namespace when it doesn't exist yet.
    pub async fn upsert_entry(&self, namespace: &str, request: &Request, response: &Response) -> Result<(), Error> {
        if !request.is_get() {
            return Err(Error::InvalidInput(format!("cannot cache {} requests", request.method)));
        }

        let namespace = namespace.to_string();
        let key_hash = request_key(&request.method, &request.url);
        let method = request.method.clone();
        let url = request.url.to_string();
        let status = i64::from(response.status);
        let response_type = response.kind.as_str();
        let response_url = response.url.as_ref().map(Url::to_string);
        let headers_json = serde_json::to_string(&response.headers).map_err(|e| Error::InvalidInput(e.to_string()))?;
        let body = response.body.to_vec();
        let now = Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO namespaces (name, created_at) VALUES (?1, ?2)",
                    params![&namespace, &now],
                )?;
                conn.execute(
                    "INSERT INTO entries (
                        namespace, key_hash, method, url, status, response_type,
                        response_url, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    ON CONFLICT(namespace, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        response_type = excluded.response_type,
                        response_url = excluded.response_url,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        &namespace,
                        &key_hash,
                        &method,
                        &url,
                        status,
                        response_type,
                        &response_url,
                        &headers_json,
                        &body,
                        &now,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get the entry for `request` in one namespace.
    pub async fn get_entry(&self, namespace: &str, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }

        let namespace = namespace.to_string();
        let key_hash = request_key(&request.method, &request.url);
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let sql = format!("SELECT {SELECT_COLUMNS} FROM entries e WHERE e.namespace = ?1 AND e.key_hash = ?2");
                let row = conn
                    .query_row(&sql, params![namespace, key_hash], EntryRow::from_row)
                    .optional()?;
                row.map(EntryRow::into_response).transpose()
            })
            .await
            .map_err(Error::from)
    }

    /// Get the entry for `request` from the oldest namespace holding one.
    pub async fn get_entry_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }

        let key_hash = request_key(&request.method, &request.url);
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let sql = format!(
                    "SELECT {SELECT_COLUMNS} FROM entries e
                     JOIN namespaces n ON n.name = e.namespace
                     WHERE e.key_hash = ?1
                     ORDER BY n.rowid ASC LIMIT 1"
                );
                let row = conn.query_row(&sql, params![key_hash], EntryRow::from_row).optional()?;
                row.map(EntryRow::into_response).transpose()
            })
            .await
            .map_err(Error::from)
    }

    /// URLs of all requests stored in a namespace, oldest first.
    pub async fn entry_urls(&self, namespace: &str) -> Result<Vec<Url>, Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<Url>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE namespace = ?1 ORDER BY rowid ASC")?;
                let urls = stmt
                    .query_map(params![namespace], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                urls.iter()
                    .map(|u| Url::parse(u).map_err(|e| Error::CorruptEntry(e.to_string())))
                    .collect()
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RequestMode;

    fn get(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = get("https://example.com/app.js");
        let resp = Response::new(200, "console.log(1)").with_header("content-type", "text/javascript");

        db.upsert_entry("app-runtime-1", &req, &resp).await.unwrap();

        let hit = db.get_entry("app-runtime-1", &req).await.unwrap().unwrap();
        assert_eq!(hit, resp);
        assert!(db.has_namespace("app-runtime-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.get_entry("app-runtime-1", &get("https://example.com/x")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = get("https://example.com/app.css");

        db.upsert_entry("rt", &req, &Response::new(200, "old")).await.unwrap();
        db.upsert_entry("rt", &req, &Response::new(200, "new")).await.unwrap();

        let hit = db.get_entry("rt", &req).await.unwrap().unwrap();
        assert_eq!(hit.body, Bytes::from("new"));
        assert_eq!(db.count_entries("rt").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_opaque_round_trip() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = get("https://fonts.gstatic.com/s/inter.woff2").with_mode(RequestMode::NoCors);

        db.upsert_entry("rt", &req, &Response::opaque("font-bytes")).await.unwrap();

        let hit = db.get_entry("rt", &req).await.unwrap().unwrap();
        assert!(hit.is_opaque());
        assert_eq!(hit.status, 0);
    }

    #[tokio::test]
    async fn test_lookup_ignores_mode_and_fragment() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_entry("shell", &get("https://example.com/index.html"), &Response::new(200, "shell"))
            .await
            .unwrap();

        let nav = Request::navigate(Url::parse("https://example.com/index.html#intro").unwrap());
        assert!(db.get_entry("shell", &nav).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_non_get_rejected_and_missed() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let post = get("https://example.com/api").with_method("POST");

        let result = db.upsert_entry("rt", &post, &Response::new(200, "{}")).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(db.get_entry_any(&post).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_any_prefers_oldest_namespace() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = get("https://example.com/icons/icon-192.png");
        db.open_namespace("app-shell-1").await.unwrap();
        db.upsert_entry("app-runtime-1", &req, &Response::new(200, "runtime")).await.unwrap();
        db.upsert_entry("app-shell-1", &req, &Response::new(200, "shell")).await.unwrap();

        let hit = db.get_entry_any(&req).await.unwrap().unwrap();
        assert_eq!(hit.body, Bytes::from("shell"));
    }

    #[tokio::test]
    async fn test_delete_namespace_cascades() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = get("https://example.com/index.html");
        db.upsert_entry("app-shell-1", &req, &Response::new(200, "x")).await.unwrap();

        db.delete_namespace("app-shell-1").await.unwrap();

        assert!(db.get_entry_any(&req).await.unwrap().is_none());
        assert_eq!(db.count_entries("app-shell-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_entry_urls_in_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_entry("shell", &get("https://example.com/"), &Response::new(200, "a")).await.unwrap();
        db.upsert_entry("shell", &get("https://example.com/index.html"), &Response::new(200, "b"))
            .await
            .unwrap();

        let urls = db.entry_urls("shell").await.unwrap();
        let paths: Vec<&str> = urls.iter().map(Url::path).collect();
        assert_eq!(paths, vec!["/", "/index.html"]);
    }
}
