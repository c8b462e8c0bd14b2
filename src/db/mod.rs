//! Database module - SQLite key/value storage for local state

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{info, warn};

use crate::counter::{CompletionCounts, COUNTS_STORAGE_KEY};

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// In-memory database, nothing survives the process
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Read a stored value
    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM storage WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    /// Write a value, replacing what was there
    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO storage (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Load completion counts; missing or unreadable data starts empty
    pub fn load_counts(&self) -> CompletionCounts {
        match self.get_item(COUNTS_STORAGE_KEY) {
            Ok(text) => {
                let counts = CompletionCounts::from_json_or_default(text.as_deref());
                info!("Loaded {} completion counters", counts.len());
                counts
            }
            Err(e) => {
                warn!("Failed to read completion counts: {}", e);
                CompletionCounts::default()
            }
        }
    }

    /// Persist completion counts
    pub fn save_counts(&self, counts: &CompletionCounts) -> Result<()> {
        let json = counts.to_json()?;
        self.set_item(COUNTS_STORAGE_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_item() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_item("nothing").unwrap(), None);
    }

    #[test]
    fn test_set_item_overwrites() {
        let db = Database::open_in_memory().unwrap();
        db.set_item("k", "one").unwrap();
        db.set_item("k", "two").unwrap();
        assert_eq!(db.get_item("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_counts_default_to_empty() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.load_counts().is_empty());
    }

    #[test]
    fn test_unparsable_counts_default_to_empty() {
        let db = Database::open_in_memory().unwrap();
        db.set_item(COUNTS_STORAGE_KEY, "{broken").unwrap();
        assert!(db.load_counts().is_empty());
    }

    #[test]
    fn test_counts_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workout.db");
        let path = path.to_str().unwrap();

        {
            let db = Database::open(path).unwrap();
            let (counts, _) = CompletionCounts::new().increment("2024-01-01-A", 2);
            db.save_counts(&counts).unwrap();
        }

        let db = Database::open(path).unwrap();
        assert_eq!(db.load_counts().get("2024-01-01-A"), 1);
    }
}
