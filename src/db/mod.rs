//! SQLite storage for retained feedback settings.

mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

/// Key of the retained mode blob.
pub const MODE_KEY: &str = "MODE";

/// Key of the retained feedback mode name.
pub const FEEDBACK_KEY: &str = "FEEDBACK";

/// Persistent key/value preferences.
///
/// Sessions read these once at start-up and write them on explicit retain
/// actions. Implementations serialize concurrent writers themselves.
pub trait Preferences: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn put(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "snipshell")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("snipshell.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.connection()?;
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Preference operations
    // ============================================================

    pub fn get_preference(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connection()?;
        let value = conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn put_preference(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.connection()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO preferences (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            (key, value, &now),
        )?;
        tracing::debug!(key, "Stored preference");
        Ok(())
    }

    /// Returns whether a value was removed.
    pub fn remove_preference(&self, key: &str) -> Result<bool> {
        let conn = self.connection()?;
        let removed = conn.execute("DELETE FROM preferences WHERE key = ?", [key])?;
        Ok(removed > 0)
    }
}

impl Preferences for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_preference(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.put_preference(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.remove_preference(key).map(|_| ())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}
