use std::sync::Arc;
use std::time::Duration;

use tracing::{info_span, Instrument};

use crate::archive::ArchivalLinker;
use crate::db::document_repo::ArchivedDocument;
use crate::db::{folder_repo, job_repo, Database};
use crate::engine::{EngineError, EngineOutput, EngineRequest, EngineSet};
use crate::error::{PortalError, Result, StorageError, ValidationError};
use crate::job::{EngineKind, Job, JobStatus, LanguageSelection};
use crate::sanitize;
use crate::settings::SettingsResolver;
use crate::storage::{ArtifactRef, ArtifactStore, Namespace};

use super::submission::Submission;

/// Number of jobs returned by [`OcrPipeline::jobs`] when no limit is given.
pub const DEFAULT_JOB_LIMIT: u64 = 25;

/// Result of a submission. The job is always in a terminal state.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub job: Job,
    pub archived: Option<ArchivedDocument>,
    /// Set when the job completed but copying it into the destination folder
    /// failed. The job stays completed.
    pub archive_error: Option<String>,
}

/// Files written for a job before its completed state is stored.
struct CapturedOutputs {
    processed: ArtifactRef,
    sidecar: Option<ArtifactRef>,
    detected_languages: Option<String>,
}

/// Takes an upload through validation, engine dispatch, output capture and
/// archival, within the caller's future.
#[derive(Clone)]
pub struct OcrPipeline {
    db: Database,
    store: Arc<dyn ArtifactStore>,
    settings: SettingsResolver,
    engines: EngineSet,
    archiver: ArchivalLinker,
    timeout: Option<Duration>,
}

impl OcrPipeline {
    pub fn new(
        db: Database,
        store: Arc<dyn ArtifactStore>,
        settings: SettingsResolver,
        engines: EngineSet,
    ) -> Self {
        let archiver = ArchivalLinker::new(db.clone(), store.clone());
        Self {
            db,
            store,
            settings,
            engines,
            archiver,
            timeout: None,
        }
    }

    /// Bounds each engine run. The engine process is killed on expiry.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    pub fn settings(&self) -> &SettingsResolver {
        &self.settings
    }

    /// Validates and runs one OCR request.
    ///
    /// Validation failures return `Err` before anything is stored. Engine
    /// failures do not: they end up as the job's `failed` state and message.
    pub async fn submit(&self, user_id: &str, submission: Submission) -> Result<SubmitOutcome> {
        let Submission {
            upload,
            auto_detect,
            languages,
            options,
            destination_folder_id,
        } = submission;

        upload.validate_pdf()?;
        let languages = LanguageSelection::from_request(auto_detect, &languages)?;
        options.validate()?;
        let folder = match &destination_folder_id {
            Some(folder_id) => Some(self.owned_folder(user_id, folder_id)?),
            None => None,
        };

        let job_id = uuid::Uuid::new_v4().to_string();
        let filename = sanitize::sanitize_filename(&upload.filename);
        let span = info_span!("pipeline.submit", job_id = %job_id, filename = %filename);

        async move {
            let source = self
                .store
                .save(Namespace::Uploads, &job_id, &filename, &upload.bytes)?;

            let mut job = Job::new(
                job_id.clone(),
                user_id,
                languages,
                options,
                destination_folder_id,
                source,
            );
            job.begin_processing()?;
            if let Err(e) = job_repo::insert(&self.db, &job.to_row()) {
                self.discard(&job.source_file);
                return Err(e.into());
            }

            self.run_job(&mut job, &upload.bytes).await;

            let mut outcome = SubmitOutcome {
                job,
                archived: None,
                archive_error: None,
            };
            if let (Some(folder), JobStatus::Completed) = (&folder, outcome.job.status()) {
                match self.archiver.archive(&outcome.job, folder) {
                    Ok(document) => outcome.archived = Some(document),
                    Err(e) => {
                        tracing::warn!(error = %e, "Archival failed, job stays completed");
                        outcome.archive_error = Some(e.to_string());
                    }
                }
            }
            Ok::<_, PortalError>(outcome)
        }
        .instrument(span)
        .await
    }

    /// Dispatches a processing job and persists its terminal state. Once the
    /// row exists every error ends up as the job's failure message.
    async fn run_job(&self, job: &mut Job, input: &[u8]) {
        let result = match self.record_engine(job) {
            Ok(engine_kind) => self.execute(job, engine_kind, input).await,
            Err(e) => Err(e.to_string()),
        };
        let result = result.and_then(|outputs| self.persist_completed(job, outputs));
        if let Err(message) = result {
            self.persist_failed(job, message);
        }
    }

    /// Resolves the active engine and records it on the job before dispatch.
    fn record_engine(&self, job: &mut Job) -> Result<EngineKind> {
        let engine_kind = self.settings.load()?.engine;
        job.options.engine = Some(engine_kind);
        job_repo::update(&self.db, &job.to_row())?;
        Ok(engine_kind)
    }

    async fn execute(
        &self,
        job: &Job,
        engine_kind: EngineKind,
        input: &[u8],
    ) -> std::result::Result<CapturedOutputs, String> {
        let request = EngineRequest {
            languages: job.languages.clone(),
            options: job.options.clone(),
        };
        let span = match engine_kind {
            EngineKind::Ocrmypdf => info_span!("engine.ocrmypdf", job_id = %job.id),
            EngineKind::Docling => info_span!("engine.docling", job_id = %job.id),
        };
        let output = self
            .dispatch(engine_kind, input, &request)
            .instrument(span)
            .await
            .map_err(|e| e.to_string())?;
        self.capture_outputs(job, engine_kind, output)
            .map_err(|e| e.to_string())
    }

    /// Writes the completed row. The job only becomes completed in memory
    /// once the row is stored; otherwise the captured outputs are removed.
    fn persist_completed(&self, job: &mut Job, outputs: CapturedOutputs) -> std::result::Result<(), String> {
        let CapturedOutputs {
            processed,
            sidecar,
            detected_languages,
        } = outputs;

        let mut completed = job.clone();
        let stored = completed
            .complete(processed.clone(), sidecar.clone(), detected_languages)
            .map_err(|e| e.to_string())
            .and_then(|stale| {
                job_repo::update(&self.db, &completed.to_row())
                    .map(|_| stale)
                    .map_err(|e| format!("Failed to record completed job: {}", e))
            });

        match stored {
            Ok(stale) => {
                if let Some(stale) = stale {
                    self.discard(&stale);
                }
                *job = completed;
                tracing::info!(job_id = %job.id, engine = ?job.engine(), "OCR job completed");
                Ok(())
            }
            Err(message) => {
                self.discard(&processed);
                if let Some(sidecar) = &sidecar {
                    self.discard(sidecar);
                }
                Err(message)
            }
        }
    }

    /// Moves the job to `failed` and makes a best-effort attempt to store it.
    fn persist_failed(&self, job: &mut Job, message: String) {
        tracing::warn!(job_id = %job.id, engine = ?job.engine(), error = %message, "OCR job failed");
        match job.fail(message) {
            Ok(artifacts) => {
                for artifact in artifacts {
                    self.discard(&artifact);
                }
            }
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "Job cannot be marked failed");
                return;
            }
        }
        if let Err(e) = job_repo::update(&self.db, &job.to_row()) {
            tracing::error!(job_id = %job.id, error = %e, "Failed to record failed job");
        }
    }

    async fn dispatch(
        &self,
        engine_kind: EngineKind,
        input: &[u8],
        request: &EngineRequest,
    ) -> std::result::Result<EngineOutput, EngineError> {
        let engine = self.engines.get(engine_kind);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, engine.run(input, request))
                .await
                .unwrap_or(Err(EngineError::TimedOut {
                    secs: limit.as_secs(),
                })),
            None => engine.run(input, request).await,
        }
    }

    /// Stores the processed PDF and, when requested and produced, the sidecar.
    /// Nothing written here survives an error.
    fn capture_outputs(
        &self,
        job: &Job,
        engine_kind: EngineKind,
        output: EngineOutput,
    ) -> std::result::Result<CapturedOutputs, StorageError> {
        let stem = sanitize::file_stem(job.source_filename());
        let processed_name = format!("{}_{}.pdf", stem, engine_kind.output_suffix());
        let processed = self
            .store
            .save(Namespace::Processed, &job.id, &processed_name, &output.pdf)?;

        let sidecar = match output.sidecar_text.filter(|_| job.options.make_sidecar) {
            Some(text) => {
                let sidecar_name = format!("{}.txt", stem);
                match self
                    .store
                    .save(Namespace::Sidecars, &job.id, &sidecar_name, text.as_bytes())
                {
                    Ok(sidecar) => Some(sidecar),
                    Err(e) => {
                        self.discard(&processed);
                        return Err(e);
                    }
                }
            }
            None => None,
        };

        Ok(CapturedOutputs {
            processed,
            sidecar,
            detected_languages: output.detected_languages,
        })
    }

    /// Best-effort artifact removal.
    fn discard(&self, artifact: &ArtifactRef) {
        if let Err(e) = self.store.delete(artifact) {
            tracing::warn!(artifact = %artifact, error = %e, "Failed to delete artifact");
        }
    }

    fn owned_folder(&self, user_id: &str, folder_id: &str) -> Result<folder_repo::Folder> {
        match folder_repo::find_by_id(&self.db, folder_id)? {
            Some(folder) if folder.user_id == user_id => Ok(folder),
            _ => Err(ValidationError::UnknownFolder(folder_id.to_string()).into()),
        }
    }

    /// A job owned by `user_id`.
    pub fn job(&self, user_id: &str, job_id: &str) -> Result<Job> {
        match job_repo::find_by_id(&self.db, job_id)? {
            Some(row) if row.user_id == user_id => Ok(Job::try_from(row)?),
            _ => Err(PortalError::NotFound(format!("job {}", job_id))),
        }
    }

    /// The user's most recent jobs, newest first.
    pub fn jobs(&self, user_id: &str, limit: Option<u64>) -> Result<Vec<Job>> {
        let (rows, _total) = job_repo::query(
            &self.db,
            &job_repo::JobFilter {
                user_id: Some(user_id.to_string()),
                limit: Some(limit.unwrap_or(DEFAULT_JOB_LIMIT)),
                ..Default::default()
            },
        )?;
        rows.into_iter()
            .map(|row| Job::try_from(row).map_err(PortalError::from))
            .collect()
    }

    /// Removes a job and its files. Archived copies are kept; their link to
    /// the job is cleared.
    pub fn delete_job(&self, user_id: &str, job_id: &str) -> Result<()> {
        let job = self.job(user_id, job_id)?;
        job_repo::delete(&self.db, &job.id)?;

        let files = std::iter::once(&job.source_file)
            .chain(job.processed_file())
            .chain(job.sidecar_file());
        for artifact in files {
            self.discard(artifact);
        }
        tracing::info!(job_id = %job.id, "Deleted job");
        Ok(())
    }
}
