//! Job orchestration: one generation run through every stage, and the
//! sweep that publishes rendered jobs later.

pub mod collaborators;
pub mod config;
pub mod context;
pub mod error;
pub mod runner;
pub mod uploads;

pub use collaborators::Collaborators;
pub use config::PipelineConfig;
pub use context::PipelineContext;
pub use error::PipelineError;
pub use runner::{derive_title, Pipeline};
pub use uploads::{SweepOutcome, UploadSweep};
