//! Opaque key/value persistence for usage snapshots.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::util;

pub const DB_FILE: &str = "devtally.db";

pub trait SnapshotStore: Send {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn store(&self, key: &str, data: &str) -> Result<()>;
}

/// Blobs in a SQLite table, zstd-compressed, with a blake3 digest of the
/// uncompressed text that is checked on every load.
pub struct SqliteStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(data_dir: &Path) -> Result<Self> {
        util::ensure_dir(data_dir)?;
        let path = data_dir.join(DB_FILE);
        let mut conn = Connection::open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        init_db(&mut conn)?;
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("snapshot database lock poisoned"))
    }
}

impl SnapshotStore for SqliteStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let row = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare("SELECT digest, data FROM blobs WHERE key = ?1")?;
            let row = stmt
                .query_row([key], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
                })
                .optional()?;
            row
        };
        let Some((digest, data)) = row else {
            return Ok(None);
        };

        let mut decoder = zstd::Decoder::new(data.as_slice())
            .with_context(|| format!("failed to open compressed blob {key}"))?;
        let mut buf = Vec::new();
        decoder
            .read_to_end(&mut buf)
            .with_context(|| format!("failed to decompress blob {key}"))?;
        let actual = util::hash_bytes(&buf);
        if actual != digest {
            bail!("blob {key} is corrupt: digest {actual} does not match {digest}");
        }
        let text = String::from_utf8(buf).with_context(|| format!("blob {key} is not UTF-8"))?;
        Ok(Some(text))
    }

    fn store(&self, key: &str, data: &str) -> Result<()> {
        let digest = util::hash_bytes(data.as_bytes());
        let mut compressed = Vec::new();
        {
            let mut encoder = zstd::Encoder::new(&mut compressed, 0)?;
            encoder.write_all(data.as_bytes())?;
            encoder.finish()?;
        }
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO blobs (key, digest, data, updated_at) VALUES (?1, ?2, ?3, ?4) ON CONFLICT(key) DO UPDATE SET digest=excluded.digest, data=excluded.data, updated_at=excluded.updated_at",
            params![key, digest, compressed, util::now_millis()],
        )
        .with_context(|| format!("failed to write blob {key}"))?;
        tracing::debug!(key, bytes = compressed.len(), "stored snapshot blob");
        Ok(())
    }
}

fn init_db(conn: &mut Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS blobs (
            key TEXT PRIMARY KEY,
            digest TEXT NOT NULL,
            data BLOB NOT NULL,
            updated_at INTEGER NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.blobs.lock().ok()?.get(key).cloned()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(blobs.get(key).cloned())
    }

    fn store(&self, key: &str, data: &str) -> Result<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        blobs.insert(key.to_string(), data.to_string());
        Ok(())
    }
}
