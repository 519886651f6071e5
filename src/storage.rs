//! Local stand-in for the recruiting-visit API.
//!
//! Everything lives in one `SQLite` file under the storage root, with
//! uploaded headshots copied alongside:
//!
//! ```text
//! <root>/
//!   intake.sqlite    # forms, submissions, faculty, profiles, users
//!   headshots/       # uploaded images, served as file:// URLs
//! ```
//!
//! [`Storage`] implements the same collaborator traits as the REST client,
//! and enforces the same server-side rules: one completed submission per
//! form and user, required answers present, headshots are images under 5MB.

mod forms;
mod profiles;
mod service;
mod submissions;

use std::{fs, io, path::PathBuf};

use rusqlite::Connection;

use crate::backend::BackendError;
use crate::model::FormId;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("form not found: {0}")]
    FormNotFound(FormId),

    #[error("You have already submitted this form")]
    AlreadySubmitted,

    /// The request broke one of the server-side rules.
    #[error("{0}")]
    Rejected(String),

    #[error("no acting user: pass --as <email>, set INTAKE_USER, or add `user = \"...\"` to ~/.intake/config.toml")]
    NoUser,

    #[error("corrupt data: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

impl From<StorageError> for BackendError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::FormNotFound(_) => Self::NotFound,
            StorageError::AlreadySubmitted | StorageError::Rejected(_) => Self::Rejected {
                message: e.to_string(),
            },
            other => Self::Storage(other),
        }
    }
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS form (
        id          INTEGER PRIMARY KEY,
        title       TEXT NOT NULL,
        descriptor  TEXT NOT NULL,
        imported_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS submission (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        form_id      INTEGER NOT NULL REFERENCES form(id),
        user         TEXT NOT NULL,
        answers      TEXT NOT NULL,
        form_version TEXT NOT NULL,
        is_completed INTEGER NOT NULL,
        submitted_at TEXT NOT NULL,
        updated_at   TEXT NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS submission_one_completed
        ON submission (form_id, user) WHERE is_completed = 1;
    CREATE TABLE IF NOT EXISTS faculty (
        id          INTEGER PRIMARY KEY,
        first_name  TEXT NOT NULL,
        last_name   TEXT NOT NULL,
        email       TEXT NOT NULL,
        room_number TEXT,
        available   INTEGER NOT NULL DEFAULT 1
    );
    CREATE TABLE IF NOT EXISTS user (
        id                  INTEGER PRIMARY KEY AUTOINCREMENT,
        email               TEXT NOT NULL UNIQUE,
        first_name          TEXT NOT NULL DEFAULT '',
        last_name           TEXT NOT NULL DEFAULT '',
        has_completed_setup INTEGER NOT NULL DEFAULT 0
    );
    CREATE TABLE IF NOT EXISTS profile (
        user         TEXT PRIMARY KEY,
        payload      TEXT NOT NULL,
        completed_at TEXT NOT NULL
    );
";

/// Local `SQLite`-backed storage.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    user: Option<String>,
}

impl Storage {
    /// Creates a new storage instance rooted at the given directory.
    ///
    /// The directory and database schema are created if missing.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let storage = Self { root, user: None };
        storage.open_db()?;
        Ok(storage)
    }

    /// Returns the default storage root: `$INTAKE_HOME` or `~/.intake/data/`.
    pub fn default_root() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("INTAKE_HOME")
            && !home.is_empty()
        {
            return Some(PathBuf::from(home));
        }
        dirs::home_dir().map(|h| h.join(".intake").join("data"))
    }

    /// Scope submissions and profile operations to `user`.
    #[must_use]
    pub fn acting_as(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    fn user(&self) -> Result<&str> {
        self.user.as_deref().ok_or(StorageError::NoUser)
    }

    /// Opens the database, applying the schema.
    fn open_db(&self) -> Result<Connection> {
        let conn = Connection::open(self.root.join("intake.sqlite"))?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }

    fn headshot_dir(&self) -> PathBuf {
        self.root.join("headshots")
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn creates_root_and_database() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("nested").join("data");
        Storage::new(&root).unwrap();
        assert!(root.join("intake.sqlite").is_file());
    }

    #[test]
    fn user_scoped_operations_need_a_user() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path()).unwrap();
        assert!(matches!(storage.user(), Err(StorageError::NoUser)));
    }

    #[test]
    fn rule_violations_become_rejections() {
        let err: BackendError = StorageError::AlreadySubmitted.into();
        assert_eq!(err.user_message(), Some("You have already submitted this form"));

        let err: BackendError = StorageError::FormNotFound(FormId(3)).into();
        assert!(matches!(err, BackendError::NotFound));
    }
}
