use std::path::PathBuf;
use thiserror::Error;

use crate::job::JobStatus;

/// Failures of the job store.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database directory could not be created.
    #[error("Cannot prepare database directory '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema migration v{version} failed: {reason}")]
    Migration { version: u32, reason: String },

    #[error("Job store lock poisoned")]
    LockPoisoned,

    #[error("Job {0} not found")]
    NotFound(i64),

    /// A status write that would move a job backwards or out of a terminal state.
    #[error("Job {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: i64,
        from: JobStatus,
        to: JobStatus,
    },
}
