use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::PathBuf;
use tracing::warn;

use crate::models::JobRecord;

/// Key under which the whole record list is stored as one JSON blob.
pub const RECORDS_KEY: &str = "jobtrail.records.v1";

/// Get/set boundary over the persistence substrate. One string value per
/// key, written whole.
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Production substrate: a single `kv` table in a SQLite file under the
/// user's data directory.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(Self { conn })
    }

    fn default_path() -> Result<PathBuf> {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobtrail") {
            Ok(proj_dirs.data_dir().join("jobtrail.db"))
        } else {
            Ok(PathBuf::from("jobtrail.db"))
        }
    }
}

impl BlobStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let result = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            });
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }
}

/// Canonical in-memory record list, mirrored to the blob store on every
/// mutation. Newest records first.
pub struct RecordStore {
    blob: Box<dyn BlobStore>,
    records: Vec<JobRecord>,
}

impl RecordStore {
    /// Read the whole blob at startup. A value that does not parse as a
    /// record array is discarded; it will be overwritten by the next
    /// mutation.
    pub fn load(blob: Box<dyn BlobStore>) -> Result<Self> {
        let records = match blob.get(RECORDS_KEY)? {
            Some(raw) => match serde_json::from_str::<Vec<JobRecord>>(&raw) {
                Ok(records) => records,
                Err(e) => {
                    warn!("discarding unreadable record blob: {e}");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        Ok(Self { blob, records })
    }

    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    pub fn find(&self, id: &str) -> Option<&JobRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Case-insensitive substring match over title and company.
    pub fn search(&self, query: &str) -> Vec<&JobRecord> {
        let needle = query.to_lowercase();
        self.records
            .iter()
            .filter(|r| {
                r.title.to_lowercase().contains(&needle)
                    || r.company.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn append(&mut self, record: JobRecord) -> Result<()> {
        self.records.insert(0, record);
        self.persist()
    }

    /// Swap the full record matching `record.id`. Returns false when no
    /// record has that id.
    pub fn replace(&mut self, record: JobRecord) -> Result<bool> {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record;
                self.persist()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Returns false when no record has that id; the list is unchanged.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        if self.records.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    fn persist(&mut self) -> Result<()> {
        let raw = serde_json::to_string(&self.records).context("Failed to serialize records")?;
        self.blob.set(RECORDS_KEY, &raw)
    }
}
