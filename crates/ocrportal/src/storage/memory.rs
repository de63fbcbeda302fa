use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StorageError;

use super::{numbered_variant, ArtifactRef, ArtifactStore, Namespace};

/// In-process artifact store.
///
/// Stands in for remote object storage: there are no directories to prepare,
/// so `ensure_namespaces` keeps the default no-op.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts.
    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys currently stored, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

impl ArtifactStore for MemoryStorage {
    fn save(
        &self,
        namespace: Namespace,
        record_id: &str,
        filename: &str,
        content: &[u8],
    ) -> Result<ArtifactRef, StorageError> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| StorageError::InvalidKey("storage lock poisoned".to_string()))?;

        for counter in 1.. {
            let candidate = ArtifactRef::new(namespace, record_id, &numbered_variant(filename, counter));
            candidate.validate()?;
            if !objects.contains_key(candidate.key()) {
                objects.insert(candidate.key().to_string(), content.to_vec());
                return Ok(candidate);
            }
        }
        unreachable!("counter range is unbounded")
    }

    fn open(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, StorageError> {
        artifact.validate()?;
        self.objects
            .read()
            .ok()
            .and_then(|o| o.get(artifact.key()).cloned())
            .ok_or_else(|| StorageError::NotFound(artifact.key().to_string()))
    }

    fn delete(&self, artifact: &ArtifactRef) -> Result<(), StorageError> {
        artifact.validate()?;
        if let Ok(mut objects) = self.objects.write() {
            objects.remove(artifact.key());
        }
        Ok(())
    }

    fn exists(&self, artifact: &ArtifactRef) -> bool {
        self.objects
            .read()
            .map(|o| o.contains_key(artifact.key()))
            .unwrap_or(false)
    }
}
