use std::path::PathBuf;

use crate::job::JobRecord;

use super::error::PipelineError;

/// State handed from one stage to the next within a single run.
pub struct PipelineContext {
    pub job: JobRecord,

    // Acquire result
    pub media_path: Option<PathBuf>,

    // Script result
    pub script: Option<String>,
    pub title: Option<String>,

    // Render result
    pub output_path: Option<PathBuf>,
}

impl PipelineContext {
    pub fn new(job: JobRecord) -> Self {
        Self {
            job,
            media_path: None,
            script: None,
            title: None,
            output_path: None,
        }
    }

    pub fn media_path(&self) -> Result<PathBuf, PipelineError> {
        self.media_path.clone().ok_or(PipelineError::MissingInput("media"))
    }

    pub fn script(&self) -> Result<String, PipelineError> {
        self.script.clone().ok_or(PipelineError::MissingInput("script"))
    }

    pub fn title(&self) -> Result<String, PipelineError> {
        self.title.clone().ok_or(PipelineError::MissingInput("title"))
    }

    pub fn output_path(&self) -> Result<PathBuf, PipelineError> {
        self.output_path
            .clone()
            .ok_or(PipelineError::MissingInput("rendered video"))
    }
}
