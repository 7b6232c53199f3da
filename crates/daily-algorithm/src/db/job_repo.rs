//! Job repository: persistence operations for the `video_jobs` table.
//!
//! Timestamps are stored as RFC 3339 UTC strings with millisecond precision,
//! so lexical order equals chronological order.

use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DatabaseError};
use crate::job::{JobFields, JobRecord, JobStatus};

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(row: &Row<'_>, idx: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

fn from_row(row: &Row<'_>) -> Result<JobRecord, rusqlite::Error> {
    let status: String = row.get("status")?;
    let status = JobStatus::from_str(&status)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

    Ok(JobRecord {
        id: row.get("id")?,
        status,
        source_url: row.get("source_url")?,
        script: row.get("script")?,
        title: row.get("title")?,
        description: row.get("description")?,
        output_path: row.get("output_path")?,
        created_at: parse_timestamp(row, "created_at")?,
        updated_at: parse_timestamp(row, "updated_at")?,
    })
}

fn select_by_id(conn: &Connection, id: i64) -> Result<Option<JobRecord>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT * FROM video_jobs WHERE id = ?1")?;
    let mut rows = stmt.query_map(params![id], from_row)?;
    match rows.next() {
        Some(Ok(row)) => Ok(Some(row)),
        Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
        None => Ok(None),
    }
}

/// Reads the current status and checks that moving to `next` is allowed.
fn check_transition(conn: &Connection, id: i64, next: JobStatus) -> Result<(), DatabaseError> {
    let current: Option<String> = conn
        .query_row(
            "SELECT status FROM video_jobs WHERE id = ?1",
            params![id],
            |r| r.get(0),
        )
        .optional()?;

    let current = current.ok_or(DatabaseError::NotFound(id))?;
    let current = JobStatus::from_str(&current)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;

    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(DatabaseError::InvalidTransition {
            id,
            from: current,
            to: next,
        })
    }
}

/// Creates a job in `pending_video` and returns it.
pub fn create(db: &Database) -> Result<JobRecord, DatabaseError> {
    db.with_conn(|conn| {
        let now = format_timestamp(Utc::now());
        conn.execute(
            "INSERT INTO video_jobs (status, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![JobStatus::PendingVideo.as_str(), now],
        )?;
        let id = conn.last_insert_rowid();
        select_by_id(conn, id)?.ok_or(DatabaseError::NotFound(id))
    })
}

/// Finds a job by its ID.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<JobRecord>, DatabaseError> {
    db.with_conn(|conn| select_by_id(conn, id))
}

/// Moves a job to `status`. Backward moves and writes to terminal jobs are rejected.
pub fn update_status(db: &Database, id: i64, status: JobStatus) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        check_transition(conn, id, status)?;
        conn.execute(
            "UPDATE video_jobs SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, status.as_str(), format_timestamp(Utc::now())],
        )?;
        Ok(())
    })
}

/// Records the discovered source URL for a job.
pub fn set_source_url(db: &Database, id: i64, url: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE video_jobs SET source_url = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, url, format_timestamp(Utc::now())],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound(id));
        }
        Ok(())
    })
}

/// Writes script, title, description, output path and status in one statement.
pub fn update_fields(
    db: &Database,
    id: i64,
    fields: &JobFields,
) -> Result<JobRecord, DatabaseError> {
    db.with_conn(|conn| {
        check_transition(conn, id, fields.status)?;
        conn.execute(
            "UPDATE video_jobs SET status = ?2, script = ?3, title = ?4, description = ?5,
             output_path = ?6, updated_at = ?7
             WHERE id = ?1",
            params![
                id,
                fields.status.as_str(),
                fields.script,
                fields.title,
                fields.description,
                fields.output_path,
                format_timestamp(Utc::now()),
            ],
        )?;
        select_by_id(conn, id)?.ok_or(DatabaseError::NotFound(id))
    })
}

/// Returns up to `limit` jobs in `status`, oldest first.
pub fn find_pending(
    db: &Database,
    status: JobStatus,
    limit: usize,
) -> Result<Vec<JobRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM video_jobs WHERE status = ?1
             ORDER BY created_at ASC, id ASC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![status.as_str(), limit as i64], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Whether a non-failed job created within `within` already used `url`.
/// A window reaching back before year 0 covers every job.
pub fn exists_duplicate(db: &Database, url: &str, within: Duration) -> Result<bool, DatabaseError> {
    // Stored timestamps are RFC 3339, so "" sorts before all of them.
    let cutoff = Utc::now()
        .checked_sub_signed(within)
        .filter(|ts| ts.year() >= 0)
        .map(format_timestamp)
        .unwrap_or_default();
    db.with_conn(|conn| {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM video_jobs
             WHERE source_url = ?1 AND status != ?2 AND created_at >= ?3",
            params![url, JobStatus::Failed.as_str(), cutoff],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    })
}

/// Returns every job, oldest first.
pub fn list_all(db: &Database) -> Result<Vec<JobRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM video_jobs ORDER BY created_at ASC, id ASC")?;
        let rows = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Deletes jobs that neither await upload nor completed. Returns the count removed.
pub fn delete_prunable(db: &Database) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let deleted = conn.execute(
            "DELETE FROM video_jobs WHERE status NOT IN (?1, ?2)",
            params![
                JobStatus::PendingUpload.as_str(),
                JobStatus::Completed.as_str()
            ],
        )?;
        Ok(deleted)
    })
}

/// Deletes every job. Returns the count removed.
pub fn delete_all(db: &Database) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| Ok(conn.execute("DELETE FROM video_jobs", [])?))
}
