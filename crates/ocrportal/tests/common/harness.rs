//! Test harness for isolated pipeline runs.
//!
//! Each harness owns a temp directory holding the media root, the scratch
//! parent and the fake engine scripts. Engines are real `OcrmypdfEngine` and
//! `DoclingEngine` instances whose program is `sh` running a script, so the
//! command lines, exit-code mapping and scratch handling are exercised for
//! real.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use ocrportal::engine::{CommandProbe, DoclingEngine, OcrmypdfEngine};
use ocrportal::{
    ArtifactStore, CapabilityRegistry, Database, EngineKind, EngineSet, FileStorage, Library, OcrPipeline,
    Portal, SettingsResolver, WordStudio,
};

use super::fixtures::{FAKE_DOCLING, FAKE_OCRMYPDF};

/// Program name that does not exist on any test host.
const MISSING_PROGRAM: &str = "ocrportal-test-missing-docling";

pub struct TestHarness {
    temp_dir: TempDir,
    /// Media root of the file store.
    pub media_dir: PathBuf,
    /// Parent directory for engine scratch areas.
    pub scratch_dir: PathBuf,
    pub db: Database,
    pub storage: Arc<FileStorage>,
    pub capabilities: Arc<CapabilityRegistry>,
    ocrmypdf_script: PathBuf,
    docling_script: PathBuf,
    docling_installed: bool,
}

impl TestHarness {
    /// Both engines installed.
    pub fn new() -> Self {
        Self::build(true)
    }

    /// The conversion engine's program cannot be found.
    pub fn without_docling() -> Self {
        Self::build(false)
    }

    fn build(docling_installed: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let media_dir = base.join("media");
        let scratch_dir = base.join("scratch");
        let scripts_dir = base.join("scripts");
        std::fs::create_dir_all(&scratch_dir).expect("Failed to create scratch dir");
        std::fs::create_dir_all(&scripts_dir).expect("Failed to create scripts dir");

        let ocrmypdf_script = scripts_dir.join("ocrmypdf.sh");
        let docling_script = scripts_dir.join("docling.sh");
        std::fs::write(&ocrmypdf_script, FAKE_OCRMYPDF).expect("Failed to write ocrmypdf script");
        std::fs::write(&docling_script, FAKE_DOCLING).expect("Failed to write docling script");

        let storage = FileStorage::new(&media_dir);
        storage.ensure_namespaces().expect("Failed to prepare media root");

        let probe = if docling_installed {
            CommandProbe::new("sh", vec![docling_script.to_string_lossy().to_string()])
        } else {
            CommandProbe::new(MISSING_PROGRAM, Vec::new())
        };

        Self {
            temp_dir,
            media_dir,
            scratch_dir,
            db: Database::open_in_memory().expect("Failed to open database"),
            storage: Arc::new(storage),
            capabilities: Arc::new(CapabilityRegistry::new(Arc::new(probe))),
            ocrmypdf_script,
            docling_script,
            docling_installed,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn store(&self) -> Arc<dyn ArtifactStore> {
        self.storage.clone()
    }

    pub fn engines(&self) -> EngineSet {
        let ocrmypdf = OcrmypdfEngine::new("sh", vec![self.ocrmypdf_script.to_string_lossy().to_string()])
            .with_scratch_dir(Some(self.scratch_dir.clone()));

        let (program, args) = if self.docling_installed {
            ("sh", vec![self.docling_script.to_string_lossy().to_string()])
        } else {
            (MISSING_PROGRAM, Vec::new())
        };
        let docling = DoclingEngine::new(program, args, self.capabilities.clone())
            .with_scratch_dir(Some(self.scratch_dir.clone()));

        EngineSet::new(Arc::new(ocrmypdf), Arc::new(docling))
    }

    pub fn settings(&self) -> SettingsResolver {
        SettingsResolver::new(self.db.clone(), self.capabilities.clone(), EngineKind::Ocrmypdf)
    }

    pub fn pipeline(&self) -> OcrPipeline {
        OcrPipeline::new(self.db.clone(), self.store(), self.settings(), self.engines())
            .with_timeout(Some(Duration::from_secs(60)))
    }

    pub fn pipeline_with_timeout(&self, timeout: Duration) -> OcrPipeline {
        self.pipeline().with_timeout(Some(timeout))
    }

    pub fn library(&self) -> Library {
        Library::new(self.db.clone(), self.store())
    }

    pub fn word_studio(&self) -> WordStudio {
        WordStudio::new(self.db.clone(), self.store(), self.pipeline())
    }

    pub fn portal(&self) -> Portal {
        Portal::new(self.db.clone(), self.store(), self.pipeline())
    }

    pub async fn select_engine(&self, engine: EngineKind) {
        self.settings()
            .set_engine(engine)
            .await
            .expect("Failed to select engine");
    }

    /// Files below a media namespace directory, recursively.
    pub fn files_under(&self, prefix: &str) -> Vec<PathBuf> {
        fn walk(dir: &Path, found: &mut Vec<PathBuf>) {
            let Ok(entries) = std::fs::read_dir(dir) else {
                return;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    walk(&path, found);
                } else {
                    found.push(path);
                }
            }
        }

        let mut found = Vec::new();
        walk(&self.media_dir.join(prefix), &mut found);
        found.sort();
        found
    }

    /// Number of scratch areas left behind.
    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(&self.scratch_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}
