//! Blogshelf database layer.
//!
//! Provides SQLite connection management and schema migrations for the
//! key-value store behind [`SqliteStorage`](crate::services::storage::SqliteStorage).
//!
//! # Usage
//!
//! ```no_run
//! use blogshelf::database::Database;
//!
//! // Open a persistent database
//! let db = Database::open("blogshelf.db").expect("failed to open database");
//!
//! // Or use an in-memory database for testing
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//!
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
