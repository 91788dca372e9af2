// Schema migrations for the lead store.
//
// Migrations are plain SQL files applied in order. Each runs at most once;
// the `schema_version` table records what has been applied. Databases created
// by the legacy web app predate this table and are adopted as version 1
// without modification.

use rusqlite::Connection;

struct Migration {
    version: i32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("migrations/001_baseline.sql"),
}];

/// Brings the database up to the latest schema version. Returns the number of
/// migrations applied.
pub fn run_migrations(conn: &Connection) -> Result<usize, String> {
    ensure_schema_version_table(conn)?;
    bootstrap_existing_db(conn)?;

    let current = current_version(conn)?;
    let latest = MIGRATIONS.iter().map(|m| m.version).max().unwrap_or(0);
    if current > latest {
        return Err(format!(
            "Database schema version ({current}) is newer than this build of leadbook \
             supports ({latest}). Update leadbook to open this database."
        ));
    }

    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();
    if pending.is_empty() {
        return Ok(0);
    }

    backup_before_migration(conn)?;

    let mut applied = 0;
    for migration in pending {
        conn.execute_batch("BEGIN")
            .map_err(|e| format!("Failed to begin migration {}: {e}", migration.version))?;
        let result = conn.execute_batch(migration.sql).and_then(|_| {
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [migration.version],
            )
            .map(|_| ())
        });
        match result {
            Ok(()) => {
                conn.execute_batch("COMMIT")
                    .map_err(|e| format!("Failed to commit migration {}: {e}", migration.version))?;
                log::info!("Applied schema migration {}", migration.version);
                applied += 1;
            }
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                return Err(format!("Migration {} failed: {e}", migration.version));
            }
        }
    }
    Ok(applied)
}

fn ensure_schema_version_table(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(|e| format!("Failed to create schema_version table: {e}"))
}

fn current_version(conn: &Connection) -> Result<i32, String> {
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| {
        row.get(0)
    })
    .map_err(|e| format!("Failed to read schema version: {e}"))
}

/// A database with lead rows but no recorded version was created before the
/// migration framework existed. Its schema matches the baseline, so it is
/// recorded as version 1 rather than re-created.
fn bootstrap_existing_db(conn: &Connection) -> Result<(), String> {
    if current_version(conn)? > 0 {
        return Ok(());
    }
    let has_leads = match conn.prepare("SELECT 1 FROM leads LIMIT 1") {
        Ok(mut stmt) => stmt
            .exists([])
            .map_err(|e| format!("Failed to probe leads table: {e}"))?,
        Err(_) => false,
    };
    if has_leads {
        conn.execute("INSERT OR IGNORE INTO schema_version (version) VALUES (1)", [])
            .map_err(|e| format!("Failed to bootstrap schema version: {e}"))?;
        log::info!("Existing lead database adopted as schema version 1");
    }
    Ok(())
}

/// Copies the database file aside before any schema change touches it.
fn backup_before_migration(conn: &Connection) -> Result<(), String> {
    let db_path: String = conn
        .query_row("PRAGMA database_list", [], |row| row.get(2))
        .map_err(|e| format!("Failed to resolve database path: {e}"))?;
    if db_path.is_empty() || db_path == ":memory:" {
        return Ok(());
    }
    let backup_path = format!("{db_path}.pre-migration.bak");
    let mut backup_conn = Connection::open(&backup_path)
        .map_err(|e| format!("Failed to open backup file {backup_path}: {e}"))?;
    let backup = rusqlite::backup::Backup::new(conn, &mut backup_conn)
        .map_err(|e| format!("Failed to start backup: {e}"))?;
    backup
        .step(-1)
        .map_err(|e| format!("Failed to write backup: {e}"))?;
    log::info!("Pre-migration backup written to {backup_path}");
    Ok(())
}
