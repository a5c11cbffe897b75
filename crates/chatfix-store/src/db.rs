use crate::error::{Error, Result};
use chatfix_types::SessionIndex;
use rusqlite::{Connection, OpenFlags, OptionalExtension, TransactionBehavior, params};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Host key holding the session index.
pub const INDEX_KEY: &str = "chat.ChatSessionStore.index";
/// Host key holding the resource-list cache (cache A).
pub const MODEL_CACHE_KEY: &str = "agentSessions.model.cache";
/// Host key holding the read/archive-state cache (cache B).
pub const STATE_CACHE_KEY: &str = "agentSessions.state.cache";

/// The three values chatfix manages inside a location's database. Cache
/// shapes are host-specific, so both caches stay opaque JSON lists.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub index: SessionIndex,
    pub model_cache: Vec<Value>,
    pub state_cache: Vec<Value>,
}

#[derive(Debug)]
pub struct WriteReceipt {
    /// Absent when the database did not exist before the write.
    pub backup_path: Option<PathBuf>,
}

/// Read the index and both caches. A missing database, missing table,
/// absent key, or unreadable value all read as empty structures; repair
/// rebuilds from disk anyway.
pub fn read(db_path: &Path) -> Result<StoreSnapshot> {
    if !db_path.exists() {
        return Ok(StoreSnapshot::default());
    }

    let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(Error::Sqlite)?;

    if !has_item_table(&conn)? {
        return Ok(StoreSnapshot::default());
    }

    Ok(StoreSnapshot {
        index: read_json(&conn, INDEX_KEY)?.unwrap_or_default(),
        model_cache: read_json(&conn, MODEL_CACHE_KEY)?.unwrap_or_default(),
        state_cache: read_json(&conn, STATE_CACHE_KEY)?.unwrap_or_default(),
    })
}

/// Replace the index and both caches.
///
/// The existing database file is first copied to a timestamped backup
/// sibling, then all three keys are rewritten inside one exclusive
/// transaction: either every key lands or the database is left untouched.
/// Fails fast with `DatabaseLocked` when another process holds the file;
/// nothing is retried.
pub fn write(db_path: &Path, snapshot: &StoreSnapshot) -> Result<WriteReceipt> {
    let backup_path = if db_path.exists() {
        Some(create_backup(db_path)?)
    } else {
        None
    };

    let index_json = serde_json::to_string(&snapshot.index)?;
    let model_json = serde_json::to_string(&snapshot.model_cache)?;
    let state_json = serde_json::to_string(&snapshot.state_cache)?;

    let mut conn = Connection::open(db_path).map_err(|e| map_sqlite(e, db_path))?;
    conn.busy_timeout(Duration::ZERO).map_err(Error::Sqlite)?;

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Exclusive)
        .map_err(|e| map_sqlite(e, db_path))?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS ItemTable (key TEXT UNIQUE ON CONFLICT REPLACE, value BLOB)",
        [],
    )
    .map_err(|e| map_sqlite(e, db_path))?;

    for (key, json) in [
        (INDEX_KEY, &index_json),
        (MODEL_CACHE_KEY, &model_json),
        (STATE_CACHE_KEY, &state_json),
    ] {
        tx.execute(
            "INSERT OR REPLACE INTO ItemTable (key, value) VALUES (?1, ?2)",
            params![key, json],
        )
        .map_err(|e| map_sqlite(e, db_path))?;
    }

    tx.commit().map_err(|e| map_sqlite(e, db_path))?;

    Ok(WriteReceipt { backup_path })
}

fn create_backup(db_path: &Path) -> Result<PathBuf> {
    let name = db_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "state.db".to_string());
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let backup = db_path.with_file_name(format!("{}.backup.{}", name, stamp));

    std::fs::copy(db_path, &backup).map_err(|source| Error::BackupFailed {
        path: backup.clone(),
        source,
    })?;

    Ok(backup)
}

fn has_item_table(conn: &Connection) -> Result<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'ItemTable'",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::Sqlite)?;
    Ok(found.is_some())
}

fn read_json<T: serde::de::DeserializeOwned>(conn: &Connection, key: &str) -> Result<Option<T>> {
    let value: Option<rusqlite::types::Value> = conn
        .query_row(
            "SELECT value FROM ItemTable WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::Sqlite)?;

    let bytes = match value {
        Some(rusqlite::types::Value::Text(s)) => s.into_bytes(),
        Some(rusqlite::types::Value::Blob(b)) => b,
        _ => return Ok(None),
    };

    Ok(serde_json::from_slice(&bytes).ok())
}

fn map_sqlite(err: rusqlite::Error, db_path: &Path) -> Error {
    if is_locked(&err) {
        Error::DatabaseLocked {
            path: db_path.to_path_buf(),
        }
    } else {
        Error::Sqlite(err)
    }
}

fn is_locked(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            )
    )
}
