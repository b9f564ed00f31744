// src/database.rs

use crate::error::StoreError;
use crate::store::Store;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;

/// SQLite-backed key/value store. Each key holds one JSON blob.
pub struct SqliteStore {
    conn: Option<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        debug!("open sqlite store at {:?}", path);
        let conn = Connection::open(path)?;
        init_db(&conn)?;
        Ok(SqliteStore { conn: Some(conn) })
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_db(&conn)?;
        Ok(SqliteStore { conn: Some(conn) })
    }

    /// Drops the underlying connection. Later operations report
    /// `ContextInvalidated` until a new store is opened.
    pub fn detach(&mut self) {
        self.conn = None;
    }

    fn conn(&self) -> Result<&Connection, StoreError> {
        self.conn.as_ref().ok_or(StoreError::ContextInvalidated)
    }
}

pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    debug!("init_db: checking key/value schema");
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )
}

impl Store for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let raw: Option<String> = self
            .conn()?
            .query_row("SELECT value FROM kv_store WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;

        raw.map(|text| {
            serde_json::from_str(&text).map_err(|source| StoreError::Malformed {
                key: key.to_string(),
                source,
            })
        })
        .transpose()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        let text = value.to_string();
        self.conn()?.execute(
            "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?, ?, datetime('now'))",
            params![key, text],
        )?;
        debug!("[DB] wrote {} bytes under `{}`", text.len(), key);
        Ok(())
    }
}
