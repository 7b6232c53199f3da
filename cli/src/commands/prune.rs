use anyhow::Result;
use daily_algorithm::maintenance;
use log::info;

use crate::app::App;

pub fn run(app: &App, all: bool) -> Result<()> {
    let db = app.open_database()?;
    let report = maintenance::prune(&db, all)?;
    if all {
        info!(
            "Deleted {} video records and {} rendered videos",
            report.records_deleted, report.files_deleted
        );
    } else {
        info!(
            "Deleted {} video records with status other than 'pending_upload' and 'completed'",
            report.records_deleted
        );
    }
    Ok(())
}
