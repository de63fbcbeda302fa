//! Entry point for front ends: the current user, access checks and file
//! downloads on top of the pipeline, library and word modules.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::db::word_repo::WordDocument;
use crate::db::Database;
use crate::engine::{CapabilityRegistry, CommandProbe, DoclingEngine, EngineSet, OcrmypdfEngine};
use crate::error::{PortalError, Result};
use crate::job::{EngineKind, Job, JobStatus};
use crate::library::Library;
use crate::pipeline::{OcrPipeline, Submission, SubmitOutcome};
use crate::storage::{ArtifactRef, ArtifactStore, FileStorage};
use crate::word::WordStudio;

/// The authenticated user a request runs as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortalUser {
    pub id: String,
    pub username: String,
    pub is_staff: bool,
}

impl PortalUser {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            is_staff: false,
        }
    }

    pub fn staff(mut self) -> Self {
        self.is_staff = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Ocr,
    Libraries,
    Preview,
    Word,
    Admin,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Ocr => "ocr",
            Operation::Libraries => "libraries",
            Operation::Preview => "preview",
            Operation::Word => "word",
            Operation::Admin => "admin",
        }
    }
}

/// Decides whether a user may run an operation.
pub trait AccessPolicy: Send + Sync {
    fn permits(&self, user: &PortalUser, operation: Operation) -> bool;
}

/// Everything is open to every user except administration, which needs staff.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl AccessPolicy for DefaultPolicy {
    fn permits(&self, user: &PortalUser, operation: Operation) -> bool {
        match operation {
            Operation::Admin => user.is_staff,
            _ => true,
        }
    }
}

/// A file handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Download {
    fn new(filename: &str, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.to_string(),
            content_type: mime_guess::from_path(filename)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    pub engine: EngineKind,
    pub label: &'static str,
    pub conversion_available: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Portal {
    pipeline: OcrPipeline,
    library: Library,
    word: WordStudio,
    policy: Arc<dyn AccessPolicy>,
}

impl Portal {
    pub fn new(db: Database, store: Arc<dyn ArtifactStore>, pipeline: OcrPipeline) -> Self {
        Self {
            library: Library::new(db.clone(), store.clone()),
            word: WordStudio::new(db, store, pipeline.clone()),
            pipeline,
            policy: Arc::new(DefaultPolicy),
        }
    }

    /// Opens the database and media root and wires both engines as
    /// configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let db = Database::open(Path::new(&config.database.path))?;

        let storage = FileStorage::new(&config.storage.root);
        storage.ensure_namespaces()?;
        let store: Arc<dyn ArtifactStore> = Arc::new(storage);

        let engines_config = &config.engines;
        let capabilities = Arc::new(CapabilityRegistry::new(Arc::new(CommandProbe::new(
            engines_config.docling.program.clone(),
            engines_config.docling.args.clone(),
        ))));
        let scratch_dir = engines_config.scratch_path();
        let ocrmypdf = OcrmypdfEngine::new(
            engines_config.ocrmypdf.program.clone(),
            engines_config.ocrmypdf.args.clone(),
        )
        .with_scratch_dir(scratch_dir.clone());
        let docling = DoclingEngine::new(
            engines_config.docling.program.clone(),
            engines_config.docling.args.clone(),
            capabilities.clone(),
        )
        .with_scratch_dir(scratch_dir);

        let settings = crate::settings::SettingsResolver::new(db.clone(), capabilities, engines_config.default);
        let pipeline = OcrPipeline::new(
            db.clone(),
            store.clone(),
            settings,
            EngineSet::new(Arc::new(ocrmypdf), Arc::new(docling)),
        )
        .with_timeout(engines_config.timeout());

        tracing::info!(
            storage_root = %crate::sanitize::redact_path(Path::new(&config.storage.root)),
            default_engine = %engines_config.default,
            "Portal initialised"
        );
        Ok(Self::new(db, store, pipeline))
    }

    pub fn with_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = policy;
        self
    }

    fn authorize(&self, user: &PortalUser, operation: Operation) -> Result<()> {
        if self.policy.permits(user, operation) {
            Ok(())
        } else {
            tracing::warn!(user = %user.username, operation = operation.as_str(), "Access denied");
            Err(PortalError::Forbidden(format!(
                "{} may not use {}",
                user.username,
                operation.as_str()
            )))
        }
    }

    pub async fn submit_ocr(&self, user: &PortalUser, submission: Submission) -> Result<SubmitOutcome> {
        self.authorize(user, Operation::Ocr)?;
        self.pipeline.submit(&user.id, submission).await
    }

    pub fn jobs(&self, user: &PortalUser, limit: Option<u64>) -> Result<Vec<Job>> {
        self.authorize(user, Operation::Ocr)?;
        self.pipeline.jobs(&user.id, limit)
    }

    pub fn job(&self, user: &PortalUser, job_id: &str) -> Result<Job> {
        self.authorize(user, Operation::Ocr)?;
        self.pipeline.job(&user.id, job_id)
    }

    pub fn delete_job(&self, user: &PortalUser, job_id: &str) -> Result<()> {
        self.authorize(user, Operation::Ocr)?;
        self.pipeline.delete_job(&user.id, job_id)
    }

    pub fn download_processed(&self, user: &PortalUser, job_id: &str) -> Result<Download> {
        self.authorize(user, Operation::Ocr)?;
        let job = self.completed_job(user, job_id)?;
        self.download(job.processed_file(), "processed file")
    }

    pub fn download_sidecar(&self, user: &PortalUser, job_id: &str) -> Result<Download> {
        self.authorize(user, Operation::Ocr)?;
        let job = self.completed_job(user, job_id)?;
        self.download(job.sidecar_file(), "sidecar")
    }

    /// The processed copy of an archived document.
    pub fn download_archived(&self, user: &PortalUser, document_id: &str) -> Result<Download> {
        self.authorize(user, Operation::Preview)?;
        let document = self.library.document(&user.id, document_id)?;
        self.download(document.processed_file.as_ref(), "processed copy")
    }

    pub fn download_word(&self, user: &PortalUser, document_id: &str) -> Result<Download> {
        self.authorize(user, Operation::Word)?;
        let document: WordDocument = self.word.document(&user.id, document_id)?;
        self.download(Some(&document.docx_file), "Word document")
    }

    /// Folder and document management for `user`.
    pub fn library(&self, user: &PortalUser) -> Result<&Library> {
        self.authorize(user, Operation::Libraries)?;
        Ok(&self.library)
    }

    pub fn word(&self, user: &PortalUser) -> Result<&WordStudio> {
        self.authorize(user, Operation::Word)?;
        Ok(&self.word)
    }

    pub async fn engine_status(&self) -> Result<EngineStatus> {
        let settings = self.pipeline.settings().load()?;
        Ok(EngineStatus {
            engine: settings.engine,
            label: settings.engine.label(),
            conversion_available: self.pipeline.settings().conversion_available().await,
            updated_at: settings.updated_at,
        })
    }

    pub async fn set_engine(&self, user: &PortalUser, engine: EngineKind) -> Result<EngineStatus> {
        self.authorize(user, Operation::Admin)?;
        self.pipeline.settings().set_engine(engine).await?;
        self.engine_status().await
    }

    fn completed_job(&self, user: &PortalUser, job_id: &str) -> Result<Job> {
        let job = self.pipeline.job(&user.id, job_id)?;
        if job.status() != JobStatus::Completed {
            return Err(PortalError::NotFound(format!("job {} has no results", job_id)));
        }
        Ok(job)
    }

    fn download(&self, artifact: Option<&ArtifactRef>, what: &str) -> Result<Download> {
        let artifact = artifact.ok_or_else(|| PortalError::NotFound(what.to_string()))?;
        if !self.pipeline.store().exists(artifact) {
            return Err(PortalError::NotFound(format!("{} {}", what, artifact.filename())));
        }
        let bytes = self.pipeline.store().open(artifact)?;
        Ok(Download::new(artifact.filename(), bytes))
    }
}
