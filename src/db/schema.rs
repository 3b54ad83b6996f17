use crate::db::*;
use crate::error::{ReaderError, Result};
use crate::reader::ProgressStore;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Arc;

/// Database wrapper for thread-safe access.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| ReaderError::Database(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_schema()?;
        Ok(db)
    }

    /// Open in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ReaderError::Database(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            -- Reading progress, one row per local file
            CREATE TABLE IF NOT EXISTS reading_progress (
                key TEXT PRIMARY KEY,
                path TEXT NOT NULL,
                fraction REAL NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_progress_updated ON reading_progress(updated_at);
            "#,
        )
        .map_err(|e| ReaderError::Database(format!("Failed to initialize schema: {}", e)))?;

        Ok(())
    }

    // ========== PROGRESS OPERATIONS ==========

    /// Save or replace progress for a key.
    pub fn save_progress(&self, progress: &StoredProgress) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO reading_progress (key, path, fraction, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
                path = excluded.path,
                fraction = excluded.fraction,
                updated_at = excluded.updated_at",
            params![
                progress.key,
                progress.path,
                progress.fraction as f64,
                progress.updated_at,
            ],
        )
        .map_err(|e| ReaderError::Database(format!("Failed to save progress: {}", e)))?;
        Ok(())
    }

    /// Get progress by key.
    pub fn get_progress(&self, key: &str) -> Result<Option<StoredProgress>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT key, path, fraction, updated_at FROM reading_progress WHERE key = ?1",
            params![key],
            |row| {
                Ok(StoredProgress {
                    key: row.get(0)?,
                    path: row.get(1)?,
                    fraction: row.get::<_, f64>(2)? as f32,
                    updated_at: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(|e| ReaderError::Database(format!("Failed to get progress: {}", e)))
    }

    /// List all progress rows, most recently updated first.
    pub fn list_progress(&self) -> Result<Vec<StoredProgress>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT key, path, fraction, updated_at FROM reading_progress
             ORDER BY updated_at DESC, path ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(StoredProgress {
                key: row.get(0)?,
                path: row.get(1)?,
                fraction: row.get::<_, f64>(2)? as f32,
                updated_at: row.get(3)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(ReaderError::from)
    }

    /// Delete progress for a key.
    pub fn delete_progress(&self, key: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM reading_progress WHERE key = ?1", params![key])
            .map_err(|e| ReaderError::Database(format!("Failed to delete progress: {}", e)))?;
        Ok(rows > 0)
    }
}

impl ProgressStore for Database {
    fn get_fraction(&self, key: &str) -> Result<Option<f32>> {
        Ok(self.get_progress(key)?.map(|p| p.fraction))
    }

    fn set_fraction(&self, key: &str, path: &Path, fraction: f32) -> Result<()> {
        self.save_progress(&StoredProgress {
            key: key.to_string(),
            path: path.to_string_lossy().to_string(),
            fraction,
            updated_at: now_timestamp(),
        })
    }

    fn clear(&self, key: &str) -> Result<bool> {
        self.delete_progress(key)
    }
}
