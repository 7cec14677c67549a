//! SQLite database connection management for Blogshelf.
//!
//! Provides the [`Database`] struct that wraps a `rusqlite::Connection`
//! and runs schema migrations on open.

use rusqlite::Connection;
use std::path::Path;

use super::migrations;

/// Database wrapper owning a `rusqlite::Connection` with the key-value schema applied.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) a SQLite database at the given file path and runs migrations.
    ///
    /// Parent directories are created when missing.
    ///
    /// # Errors
    /// Returns `rusqlite::Error` if the connection cannot be established or migrations fail.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(err) = std::fs::create_dir_all(parent) {
                    tracing::warn!(%err, dir = %parent.display(), "could not create database directory");
                }
            }
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        migrations::run_all(&db.conn)?;
        Ok(db)
    }

    /// Opens an in-memory SQLite database and runs migrations.
    ///
    /// The data is discarded when the `Database` is dropped.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        migrations::run_all(&db.conn)?;
        Ok(db)
    }

    /// Returns a reference to the underlying `rusqlite::Connection`.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
