//! Cleanup of job records and their rendered videos.

use std::path::Path;

use log::{info, warn};
use serde::Serialize;

use crate::db::{job_repo, Database, DatabaseError};
use crate::sanitize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub records_deleted: usize,
    pub files_deleted: usize,
}

/// Deletes jobs that are neither waiting for upload nor completed.
///
/// With `all`, deletes every job and the rendered video each one references.
/// A video that cannot be removed is logged and skipped.
pub fn prune(db: &Database, all: bool) -> Result<PruneReport, DatabaseError> {
    if !all {
        let records_deleted = job_repo::delete_prunable(db)?;
        info!("Deleted {} unfinished job records", records_deleted);
        return Ok(PruneReport {
            records_deleted,
            files_deleted: 0,
        });
    }

    let mut files_deleted = 0;
    for job in job_repo::list_all(db)? {
        let Some(output) = job.output_path.as_deref() else {
            continue;
        };
        let path = Path::new(output);
        if !path.exists() {
            continue;
        }
        match std::fs::remove_file(path) {
            Ok(()) => {
                info!("Deleted rendered video {}", sanitize::redact_path(path));
                files_deleted += 1;
            }
            Err(e) => warn!(
                "Failed to delete rendered video {}: {}",
                sanitize::redact_path(path),
                e
            ),
        }
    }

    let records_deleted = job_repo::delete_all(db)?;
    info!("Deleted all {} job records", records_deleted);
    Ok(PruneReport {
        records_deleted,
        files_deleted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobFields, JobStatus};

    fn rendered_job(db: &Database, output: &Path) -> i64 {
        let job = job_repo::create(db).unwrap();
        for status in [
            JobStatus::PendingScript,
            JobStatus::PendingAudio,
            JobStatus::PendingRender,
        ] {
            job_repo::update_status(db, job.id, status).unwrap();
        }
        job_repo::update_fields(
            db,
            job.id,
            &JobFields {
                status: JobStatus::PendingUpload,
                script: "script".to_string(),
                title: "title".to_string(),
                description: "script".to_string(),
                output_path: output.to_string_lossy().into_owned(),
            },
        )
        .unwrap();
        job.id
    }

    #[test]
    fn test_prune_keeps_uploadable_and_completed() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();

        let waiting = rendered_job(&db, &dir.path().join("a.mp4"));
        let done = rendered_job(&db, &dir.path().join("b.mp4"));
        job_repo::update_status(&db, done, JobStatus::Completed).unwrap();
        let failed = job_repo::create(&db).unwrap().id;
        job_repo::update_status(&db, failed, JobStatus::Failed).unwrap();
        let in_flight = job_repo::create(&db).unwrap().id;

        let report = prune(&db, false).unwrap();
        assert_eq!(report.records_deleted, 2);
        assert_eq!(report.files_deleted, 0);

        assert!(job_repo::find_by_id(&db, waiting).unwrap().is_some());
        assert!(job_repo::find_by_id(&db, done).unwrap().is_some());
        assert!(job_repo::find_by_id(&db, failed).unwrap().is_none());
        assert!(job_repo::find_by_id(&db, in_flight).unwrap().is_none());
    }

    #[test]
    fn test_prune_all_removes_rendered_files() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();

        let present = dir.path().join("present.mp4");
        std::fs::write(&present, b"video").unwrap();
        rendered_job(&db, &present);
        rendered_job(&db, &dir.path().join("already-gone.mp4"));
        job_repo::create(&db).unwrap();

        let report = prune(&db, true).unwrap();
        assert_eq!(report.records_deleted, 3);
        assert_eq!(report.files_deleted, 1);
        assert!(!present.exists());
        assert!(job_repo::list_all(&db).unwrap().is_empty());
    }
}
