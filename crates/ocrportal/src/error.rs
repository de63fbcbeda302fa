use std::path::PathBuf;
use thiserror::Error;

use crate::engine::EngineError;
use crate::job::JobError;
use crate::library::LibraryError;
use crate::word::WordError;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Word document error: {0}")]
    Word(#[from] WordError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
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
}

/// Rejections raised before any job row exists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Select at least one language or enable automatic language detection")]
    MissingLanguages,

    #[error("Invalid language code '{0}'")]
    InvalidLanguage(String),

    #[error("Only PDF files are accepted (got '{0}')")]
    NotPdf(String),

    #[error("Unsupported content type '{0}', expected application/pdf")]
    UnsupportedContentType(String),

    #[error("The uploaded file is empty")]
    EmptyUpload,

    #[error("Optimize level must be between 0 and 3 (got {0})")]
    OptimizeOutOfRange(u8),

    #[error("Destination folder '{0}' does not exist")]
    UnknownFolder(String),

    #[error("Title must not be empty")]
    EmptyTitle,
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

    #[error("Failed to delete file '{path}': {source}")]
    DeleteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact not found: {0}")]
    NotFound(String),

    #[error("Invalid artifact key: {0}")]
    InvalidKey(String),

    #[error("File already exists: {0}")]
    FileExists(PathBuf),
}

pub type Result<T> = std::result::Result<T, PortalError>;
