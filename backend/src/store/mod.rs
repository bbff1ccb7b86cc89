//! SQLite persistence for templates and upload history.
//!
//! A connection is opened per operation; the database is small and rusqlite
//! connections are cheap, so nothing is pooled.

mod templates;
mod uploads;

use crate::error::Result;
use rusqlite::Connection;
use std::path::PathBuf;

const CREATE_TEMPLATES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS templates (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL,
    image TEXT NOT NULL,
    image_width INTEGER NOT NULL,
    image_height INTEGER NOT NULL,
    text_boxes TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

const CREATE_TEMPLATES_SESSION_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_templates_session ON templates(session_id)
";

const CREATE_UPLOADS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS uploads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    filename TEXT NOT NULL,
    file_path TEXT NOT NULL,
    file_size INTEGER NOT NULL,
    file_type TEXT NOT NULL,
    md5 TEXT NOT NULL,
    uploaded_at TEXT NOT NULL
)
";

const CREATE_UPLOADS_SESSION_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_uploads_session_kind ON uploads(session_id, kind, id DESC)
";

const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_TEMPLATES_TABLE,
    CREATE_TEMPLATES_SESSION_INDEX,
    CREATE_UPLOADS_TABLE,
    CREATE_UPLOADS_SESSION_INDEX,
];

#[derive(Clone, Debug)]
pub struct Db {
    path: PathBuf,
    history_limit: usize,
}

impl Db {
    pub fn new(path: impl Into<PathBuf>, history_limit: usize) -> Self {
        Self {
            path: path.into(),
            history_limit,
        }
    }

    pub(crate) fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    /// Creates tables and indexes that do not exist yet.
    pub fn migrate(&self) -> Result<()> {
        let conn = self.connect()?;
        for statement in SCHEMA_STATEMENTS {
            conn.execute(statement, [])?;
        }
        Ok(())
    }

    /// Opens the database and runs a trivial query.
    pub fn ping(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}
