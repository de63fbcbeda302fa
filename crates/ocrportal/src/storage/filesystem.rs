use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

use super::{numbered_variant, ArtifactRef, ArtifactStore, Namespace};

/// Highest numbered variant tried before giving up on a name.
const MAX_CONFLICT_ATTEMPTS: u32 = 1000;

/// Local-disk artifact store rooted at a media directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of an artifact on disk.
    pub fn path_of(&self, artifact: &ArtifactRef) -> Result<PathBuf, StorageError> {
        artifact.validate()?;
        Ok(self.root.join(artifact.key()))
    }

    fn ensure_directory(&self, path: &Path) -> Result<(), StorageError> {
        if !path.exists() {
            std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Writes content using exclusive creation so two writers never share a
    /// file. Tries the original name first, then numbered variants.
    fn store_with_atomic_creation(
        &self,
        namespace: Namespace,
        record_id: &str,
        filename: &str,
        content: &[u8],
    ) -> Result<ArtifactRef, StorageError> {
        for counter in 1..=MAX_CONFLICT_ATTEMPTS {
            let candidate = ArtifactRef::new(namespace, record_id, &numbered_variant(filename, counter));
            let try_path = self.path_of(&candidate)?;

            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&try_path)
            {
                Ok(mut file) => {
                    write_or_remove(&mut file, &try_path, content)?;
                    return Ok(candidate);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StorageError::WriteFile {
                        path: try_path,
                        source: e,
                    });
                }
            }
        }

        Err(StorageError::FileExists(
            self.root
                .join(namespace.prefix())
                .join(record_id)
                .join(filename),
        ))
    }
}

/// Writes `content` to a freshly created file. A partial file is removed
/// when the write fails.
fn write_or_remove<W: Write>(file: &mut W, path: &Path, content: &[u8]) -> Result<(), StorageError> {
    if let Err(e) = file.write_all(content).and_then(|_| file.flush()) {
        if let Err(remove_err) = std::fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %remove_err, "Failed to remove partial file");
        }
        return Err(StorageError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}

impl ArtifactStore for FileStorage {
    fn save(
        &self,
        namespace: Namespace,
        record_id: &str,
        filename: &str,
        content: &[u8],
    ) -> Result<ArtifactRef, StorageError> {
        let target = ArtifactRef::new(namespace, record_id, filename);
        let target_path = self.path_of(&target)?;
        if let Some(dir) = target_path.parent() {
            self.ensure_directory(dir)?;
        }

        self.store_with_atomic_creation(namespace, record_id, filename, content)
    }

    fn open(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, StorageError> {
        let path = self.path_of(artifact)?;
        std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(artifact.key().to_string())
            } else {
                StorageError::ReadFile { path, source: e }
            }
        })
    }

    fn delete(&self, artifact: &ArtifactRef) -> Result<(), StorageError> {
        let path = self.path_of(artifact)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StorageError::DeleteFile { path, source: e }),
        }

        // Drop the per-record directory once it is empty; failures are harmless.
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir(dir);
        }
        Ok(())
    }

    fn exists(&self, artifact: &ArtifactRef) -> bool {
        self.path_of(artifact).map(|p| p.is_file()).unwrap_or(false)
    }

    fn ensure_namespaces(&self) -> Result<(), StorageError> {
        for namespace in Namespace::ALL {
            self.ensure_directory(&self.root.join(namespace.prefix()))?;
        }
        Ok(())
    }
}
