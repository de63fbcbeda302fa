use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::EngineError;

/// Private temporary directory for one engine invocation.
///
/// The directory and everything in it is removed when the value is dropped,
/// whichever way the invocation ends.
#[derive(Debug)]
pub struct ScratchArea {
    dir: TempDir,
}

impl ScratchArea {
    /// Creates a scratch directory under `parent`, or the system temp dir.
    pub fn new(parent: Option<&Path>) -> Result<Self, EngineError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ocrportal-");
        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent).map_err(|e| {
                    EngineError::Processing(format!(
                        "Cannot create scratch directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
                builder.tempdir_in(parent)
            }
            None => builder.tempdir(),
        }
        .map_err(|e| EngineError::Processing(format!("Cannot create scratch directory: {}", e)))?;

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn input_path(&self) -> PathBuf {
        self.dir.path().join("input.pdf")
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.path().join("output.pdf")
    }

    pub fn sidecar_path(&self) -> PathBuf {
        self.dir.path().join("sidecar.txt")
    }

    /// Writes the job's source bytes as the engine input.
    pub async fn write_input(&self, bytes: &[u8]) -> Result<PathBuf, EngineError> {
        let path = self.input_path();
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| EngineError::Processing(format!("Cannot write engine input: {}", e)))?;
        Ok(path)
    }
}
