//! Artifact persistence for uploads, OCR outputs, sidecars and library copies.
//!
//! Artifacts are addressed by an [`ArtifactRef`] key of the form
//! `<namespace>/<record-id>/<filename>`. The record id is the owning job or
//! document id, so filenames only need to be unique per record.

pub mod filesystem;
pub mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

pub use filesystem::FileStorage;
pub use memory::MemoryStorage;

/// Logical storage areas. Each maps to one directory on a local backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Uploads,
    Processed,
    Sidecars,
    LibraryOriginals,
    LibraryProcessed,
    WordSources,
    WordDocuments,
}

impl Namespace {
    pub const ALL: [Namespace; 7] = [
        Namespace::Uploads,
        Namespace::Processed,
        Namespace::Sidecars,
        Namespace::LibraryOriginals,
        Namespace::LibraryProcessed,
        Namespace::WordSources,
        Namespace::WordDocuments,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Uploads => "uploads",
            Namespace::Processed => "processed",
            Namespace::Sidecars => "sidecars",
            Namespace::LibraryOriginals => "libraries/originals",
            Namespace::LibraryProcessed => "libraries/processed",
            Namespace::WordSources => "word/source",
            Namespace::WordDocuments => "word/documents",
        }
    }
}

/// Reference to a stored artifact, persisted as its key string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new(namespace: Namespace, record_id: &str, filename: &str) -> Self {
        Self(format!("{}/{}/{}", namespace.prefix(), record_id, filename))
    }

    /// Rebuilds a reference from a persisted key.
    pub fn from_key(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn key(&self) -> &str {
        &self.0
    }

    /// The last path component, used as the download name.
    pub fn filename(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Rejects keys that could escape the storage root.
    pub fn validate(&self) -> Result<(), StorageError> {
        let key = self.0.as_str();
        if key.is_empty()
            || key.starts_with('/')
            || key.contains('\\')
            || key.split('/').any(|part| part.is_empty() || part == "." || part == "..")
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backing medium for artifacts (local disk, object storage, ...).
pub trait ArtifactStore: Send + Sync {
    /// Stores `content` under `<namespace>/<record_id>/<filename>`. When that
    /// name is taken, a numbered variant is used; the returned reference is
    /// the one actually written.
    fn save(
        &self,
        namespace: Namespace,
        record_id: &str,
        filename: &str,
        content: &[u8],
    ) -> Result<ArtifactRef, StorageError>;

    fn open(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, StorageError>;

    /// Deletes the artifact. Deleting a missing artifact is not an error.
    fn delete(&self, artifact: &ArtifactRef) -> Result<(), StorageError>;

    fn exists(&self, artifact: &ArtifactRef) -> bool;

    /// Prepares the namespace layout. No-op for backends without directories.
    fn ensure_namespaces(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Copies an artifact into another location of the same store.
    fn copy(
        &self,
        artifact: &ArtifactRef,
        namespace: Namespace,
        record_id: &str,
    ) -> Result<ArtifactRef, StorageError> {
        let content = self.open(artifact)?;
        self.save(namespace, record_id, artifact.filename(), &content)
    }
}

/// Returns `name_2.ext`, `name_3.ext`, ... for conflict resolution.
pub(crate) fn numbered_variant(filename: &str, counter: u32) -> String {
    if counter <= 1 {
        return filename.to_string();
    }
    match filename.rfind('.') {
        Some(dot_pos) if dot_pos > 0 => format!(
            "{}_{}{}",
            &filename[..dot_pos],
            counter,
            &filename[dot_pos..]
        ),
        _ => format!("{}_{}", filename, counter),
    }
}
