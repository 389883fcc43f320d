use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};

use crate::overlays::model::Overlay;
use crate::shell::error::{ShellError, ShellResult};

/// Persistence for overlays
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OverlayStore: Send + Sync {
    /// All overlays, newest key first
    async fn list(&self) -> ShellResult<Vec<Overlay>>;

    async fn get(&self, key: u64) -> ShellResult<Overlay>;

    /// Insert when `key` is 0, otherwise update the existing record.
    /// Stamps the modification time and returns the stored overlay.
    async fn save(&self, overlay: Overlay) -> ShellResult<Overlay>;

    async fn delete(&self, key: u64) -> ShellResult<()>;
}

fn not_found(key: u64) -> ShellError {
    ShellError::NotFound(format!("overlay {}", key))
}

/// Process-local overlay store
#[derive(Debug)]
pub struct MemoryOverlayStore {
    overlays: DashMap<u64, Overlay>,
    next_key: AtomicU64,
}

impl MemoryOverlayStore {
    pub fn new() -> Self {
        Self {
            overlays: DashMap::new(),
            next_key: AtomicU64::new(1),
        }
    }
}

impl Default for MemoryOverlayStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OverlayStore for MemoryOverlayStore {
    async fn list(&self) -> ShellResult<Vec<Overlay>> {
        let mut overlays: Vec<Overlay> = self.overlays.iter().map(|entry| entry.value().clone()).collect();
        overlays.sort_by(|a, b| b.key.cmp(&a.key));
        Ok(overlays)
    }

    async fn get(&self, key: u64) -> ShellResult<Overlay> {
        self.overlays
            .get(&key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| not_found(key))
    }

    async fn save(&self, mut overlay: Overlay) -> ShellResult<Overlay> {
        overlay.last_modified_time = Utc::now();
        if overlay.key == 0 {
            overlay.key = self.next_key.fetch_add(1, Ordering::SeqCst);
            debug!("Created overlay {}", overlay.key);
            self.overlays.insert(overlay.key, overlay.clone());
            return Ok(overlay);
        }

        // In place under the shard lock; a key deleted meanwhile stays deleted
        match self.overlays.get_mut(&overlay.key) {
            Some(mut entry) => *entry = overlay.clone(),
            None => return Err(not_found(overlay.key)),
        }
        Ok(overlay)
    }

    async fn delete(&self, key: u64) -> ShellResult<()> {
        self.overlays.remove(&key).map(|_| ()).ok_or_else(|| not_found(key))
    }
}

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS overlays (
    key INTEGER PRIMARY KEY AUTOINCREMENT,
    body TEXT NOT NULL
)";

/// SQLite-backed overlay store. Each overlay is kept as a JSON document;
/// the row id is the overlay key.
#[derive(Debug, Clone)]
pub struct SqliteOverlayStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteOverlayStore {
    pub fn open<P: AsRef<Path>>(path: P) -> ShellResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        info!("Opened overlay database {}", path.as_ref().display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> ShellResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> ShellResult<Self> {
        conn.execute(CREATE_TABLE, [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `op` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, op: F) -> ShellResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> ShellResult<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| ShellError::StorageError("overlay database lock poisoned".to_string()))?;
            op(&conn)
        })
        .await
        .map_err(|e| ShellError::StorageError(e.to_string()))?
    }
}

fn decode(key: i64, body: &str) -> ShellResult<Overlay> {
    let mut overlay: Overlay = serde_json::from_str(body)
        .map_err(|e| ShellError::StorageError(format!("overlay {}: {}", key, e)))?;
    overlay.key = key as u64;
    Ok(overlay)
}

#[async_trait]
impl OverlayStore for SqliteOverlayStore {
    async fn list(&self) -> ShellResult<Vec<Overlay>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key, body FROM overlays ORDER BY key DESC")?;
            let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;
            let mut overlays = Vec::new();
            for row in rows {
                let (key, body) = row?;
                overlays.push(decode(key, &body)?);
            }
            Ok(overlays)
        })
        .await
    }

    async fn get(&self, key: u64) -> ShellResult<Overlay> {
        self.with_conn(move |conn| {
            let body: Option<String> = conn
                .query_row("SELECT body FROM overlays WHERE key = ?1", params![key as i64], |row| row.get(0))
                .optional()?;
            match body {
                Some(body) => decode(key as i64, &body),
                None => Err(not_found(key)),
            }
        })
        .await
    }

    async fn save(&self, mut overlay: Overlay) -> ShellResult<Overlay> {
        overlay.last_modified_time = Utc::now();
        self.with_conn(move |conn| {
            let body = serde_json::to_string(&overlay)?;
            if overlay.key == 0 {
                conn.execute("INSERT INTO overlays (body) VALUES (?1)", params![body])?;
                overlay.key = conn.last_insert_rowid() as u64;
                debug!("Created overlay {}", overlay.key);
            } else {
                let changed = conn.execute(
                    "UPDATE overlays SET body = ?1 WHERE key = ?2",
                    params![body, overlay.key as i64],
                )?;
                if changed == 0 {
                    return Err(not_found(overlay.key));
                }
            }
            Ok(overlay)
        })
        .await
    }

    async fn delete(&self, key: u64) -> ShellResult<()> {
        self.with_conn(move |conn| {
            let changed = conn.execute("DELETE FROM overlays WHERE key = ?1", params![key as i64])?;
            if changed == 0 {
                Err(not_found(key))
            } else {
                Ok(())
            }
        })
        .await
    }
}
