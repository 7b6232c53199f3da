use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TdaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("External service error: {0}")]
    External(#[from] ExternalError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Authentication error: {0}")]
    Auth(#[from] crate::auth::AuthError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid schedule '{expression}': {reason}")]
    InvalidSchedule { expression: String, reason: String },

    #[error("Required environment variable {name} is not set")]
    MissingSecret { name: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy '{from}' to '{to}': {source}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures reported by the external tools and HTTP services the pipeline drives.
#[derive(Error, Debug)]
pub enum ExternalError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' failed: {message}")]
    CommandFailed { program: String, message: String },

    #[error("'{program}' timed out after {seconds}s")]
    CommandTimeout { program: String, seconds: u64 },

    #[error("Unexpected output from '{program}': {message}")]
    UnexpectedOutput { program: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Invalid response from {service}: {message}")]
    InvalidResponse { service: String, message: String },

    #[error("{service} did not finish processing within {attempts} attempts")]
    ProcessingTimeout { service: String, attempts: u32 },

    #[error("No source candidates found in '{feed}'")]
    NoCandidates { feed: String },

    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TdaError>;
