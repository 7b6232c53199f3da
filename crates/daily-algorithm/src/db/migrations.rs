//! Schema versioning for the job store.
//!
//! Applied versions are recorded in `schema_migrations`; each pending step
//! runs in its own transaction together with its bookkeeping row.

use rusqlite::{params, Connection};

use super::error::DatabaseError;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_video_jobs_table",
        sql: include_str!("sql/001_create_video_jobs.sql"),
    },
    Migration {
        version: 2,
        name: "create_video_jobs_indexes",
        sql: include_str!("sql/002_create_video_jobs_indexes.sql"),
    },
];

/// Highest version recorded on this connection, 0 for a fresh database.
pub fn current_version(conn: &Connection) -> Result<u32, DatabaseError> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Brings the job store schema up to date.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );",
    )?;

    let applied = current_version(conn)?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        log::info!("Applying schema v{} ({})", migration.version, migration.name);
        apply(conn, migration).map_err(|e| DatabaseError::Migration {
            version: migration.version,
            reason: e.to_string(),
        })?;
    }

    Ok(())
}

fn apply(conn: &Connection, migration: &Migration) -> rusqlite::Result<()> {
    // Dropping the transaction without commit rolls the step back.
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql)?;
    tx.execute(
        "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
        params![migration.version, migration.name],
    )?;
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrated() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_all(&conn).unwrap();
        conn
    }

    #[test]
    fn test_fresh_db_reaches_latest_version() {
        let conn = migrated();
        let latest = MIGRATIONS.last().map(|m| m.version).unwrap();
        assert_eq!(current_version(&conn).unwrap(), latest);
    }

    #[test]
    fn test_rerun_applies_nothing() {
        let conn = migrated();
        run_all(&conn).unwrap();
        let rows: u32 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_new_job_row_starts_pending_video() {
        let conn = migrated();
        conn.execute(
            "INSERT INTO video_jobs (created_at, updated_at) VALUES ('2026-01-01T00:00:00.000Z', '2026-01-01T00:00:00.000Z')",
            [],
        )
        .unwrap();
        let status: String = conn
            .query_row("SELECT status FROM video_jobs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(status, "pending_video");
    }

    #[test]
    fn test_schema_rejects_unknown_status() {
        let conn = migrated();
        let result = conn.execute(
            "INSERT INTO video_jobs (status, created_at, updated_at) VALUES ('bogus', 'x', 'x')",
            [],
        );
        assert!(result.is_err());
    }
}
