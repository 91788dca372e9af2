// SQLite-backed persistence for leadbook.
//
// `LeadStore` owns a single connection. Queries live in per-area files
// (`leads`, `reports`) as `impl LeadStore` blocks; this module handles
// opening, migrations, transactions, and legacy data repair.
//
// Timestamps are stored as RFC 3339 UTC text, so string comparison in SQL
// matches chronological order. Rows written by the legacy web app used naive
// `YYYY-MM-DD HH:MM:SS.ffffff` text; those are rewritten on open and
// tolerated on read.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use thiserror::Error;

use crate::config::Config;

pub mod leads;
pub mod reports;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Could not determine home directory")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("Schema migration failed: {0}")]
    Migration(String),
}

pub struct LeadStore {
    conn: Connection,
}

impl LeadStore {
    /// Opens the store at the default location, `~/.leadbook/leadbook.db`.
    pub fn open() -> Result<Self, DbError> {
        Self::open_at(Self::db_path()?)
    }

    /// Opens the store named by the config, falling back to the default path.
    pub fn open_from_config(config: &Config) -> Result<Self, DbError> {
        match config.database_url.as_deref() {
            Some(url) => Self::open_from_url(url),
            None => Self::open(),
        }
    }

    /// Opens the store from a connection string such as `sqlite:///leads.db`.
    pub fn open_from_url(url: &str) -> Result<Self, DbError> {
        Self::open_at(database_path_from_url(url)?)
    }

    fn db_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".leadbook").join("leadbook.db"))
    }

    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;

        // Legacy data repairs. Best effort; a failure here must not block open.
        let _ = Self::normalize_legacy_timestamps(&conn);

        Ok(Self { conn })
    }

    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Runs `f` inside an immediate transaction. Commits on `Ok`, rolls back
    /// on `Err`. Read-modify-write sequences go through here so concurrent
    /// writers serialize at BEGIN instead of failing mid-flight.
    pub fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<DbError>,
        F: FnOnce(&Self) -> Result<T, E>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| E::from(DbError::from(e)))?;
        match f(self) {
            Ok(value) => {
                self.conn
                    .execute_batch("COMMIT")
                    .map_err(|e| E::from(DbError::from(e)))?;
                Ok(value)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Rewrites naive legacy timestamps to RFC 3339 so SQL comparisons
    /// against parameter bounds stay correct. Idempotent.
    fn normalize_legacy_timestamps(conn: &Connection) -> Result<usize, DbError> {
        let rows: Vec<(String, String, String)> = {
            let mut stmt = conn.prepare(
                "SELECT id, created_at, next_followup FROM leads
                 WHERE created_at NOT LIKE '%T%' OR next_followup NOT LIKE '%T%'",
            )?;
            let mapped = stmt.query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?;
            mapped.collect::<Result<Vec<_>, _>>()?
        };

        let mut updated = 0;
        for (id, created_raw, followup_raw) in rows {
            let (Some(created), Some(followup)) = (
                parse_db_timestamp(&created_raw),
                parse_db_timestamp(&followup_raw),
            ) else {
                log::warn!("lead {id}: unparseable timestamps, leaving row as is");
                continue;
            };
            conn.execute(
                "UPDATE leads SET created_at = ?1, next_followup = ?2 WHERE id = ?3",
                params![created.to_rfc3339(), followup.to_rfc3339(), id],
            )?;
            updated += 1;
        }
        if updated > 0 {
            log::info!("Normalized {updated} legacy lead timestamps to RFC 3339");
        }
        Ok(updated)
    }
}

/// Extracts the file path from a SQLAlchemy-style SQLite URL. Bare paths are
/// accepted as-is; any other scheme is rejected.
pub(crate) fn database_path_from_url(url: &str) -> Result<PathBuf, DbError> {
    let trimmed = url.trim();
    let path = if let Some(rest) = trimmed.strip_prefix("sqlite:///") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("sqlite://") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("sqlite:") {
        rest
    } else if trimmed.contains("://") {
        return Err(DbError::InvalidDatabaseUrl(trimmed.to_string()));
    } else {
        trimmed
    };
    if path.is_empty() {
        return Err(DbError::InvalidDatabaseUrl(trimmed.to_string()));
    }
    Ok(PathBuf::from(path))
}

/// Parses a stored timestamp. RFC 3339 first, then the naive format the
/// legacy web app wrote, interpreted as UTC.
pub(crate) fn parse_db_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
