pub mod archive;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod job;
pub mod library;
pub mod pipeline;
pub mod portal;
pub mod sanitize;
pub mod settings;
pub mod storage;
pub mod word;

pub use archive::ArchivalLinker;
pub use config::{load_config, load_config_from_str, Config};
pub use db::document_repo::ArchivedDocument;
pub use db::folder_repo::Folder;
pub use db::word_repo::WordDocument;
pub use db::{Database, DatabaseError};
pub use engine::{CapabilityRegistry, EngineError, EngineSet, OcrEngine};
pub use error::{ConfigError, PortalError, Result, StorageError, ValidationError};
pub use job::{EngineKind, Job, JobError, JobStatus, LanguageSelection, OcrOptions, OutputType};
pub use library::{Library, LibraryError, NewFolder};
pub use pipeline::{OcrPipeline, Submission, SubmitOutcome, Upload};
pub use portal::{AccessPolicy, DefaultPolicy, Download, EngineStatus, Operation, Portal, PortalUser};
pub use settings::{PortalSettings, SettingsResolver};
pub use storage::{ArtifactRef, ArtifactStore, FileStorage, MemoryStorage, Namespace};
pub use word::{WordError, WordStudio};
