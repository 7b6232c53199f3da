pub mod ai;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod job;
pub mod maintenance;
pub mod media;
pub mod narration;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod sanitize;
pub mod secrets;
pub mod service;

pub use auth::{AuthError, CredentialStore, RefreshScheduler, TokenProvider, Tokens};
pub use cache::{CacheKey, TtlCache};
pub use config::{load_config, load_or_default, AppPaths, Config, LogFormat};
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, ExternalError, Result, StorageError, TdaError};
pub use job::{JobRecord, JobStatus};
pub use pipeline::{Collaborators, Pipeline, PipelineConfig, PipelineError, UploadSweep};
pub use publish::PrivacyStatus;
pub use secrets::{require_secret, GoogleClientCredentials};
