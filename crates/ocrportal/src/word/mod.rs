//! Word document generation: typed-in documents and PDF-to-Word conversion.

pub mod docx;

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::db::word_repo::{self, WordDocument};
use crate::db::Database;
use crate::error::{Result, ValidationError};
use crate::job::{JobStatus, OcrOptions};
use crate::pipeline::{OcrPipeline, Submission, Upload};
use crate::sanitize;
use crate::storage::{ArtifactRef, ArtifactStore, Namespace};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WordError {
    #[error("Failed to build document: {0}")]
    Build(String),

    #[error("PDF conversion failed: {0}")]
    ConversionFailed(String),

    #[error("Word document '{0}' not found")]
    NotFound(String),
}

#[derive(Clone)]
pub struct WordStudio {
    db: Database,
    store: Arc<dyn ArtifactStore>,
    pipeline: OcrPipeline,
}

impl WordStudio {
    pub fn new(db: Database, store: Arc<dyn ArtifactStore>, pipeline: OcrPipeline) -> Self {
        Self { db, store, pipeline }
    }

    /// Builds a document from a title and a body, one paragraph per line.
    pub fn create(&self, user_id: &str, title: &str, body: &str) -> Result<WordDocument> {
        let title = validate_title(title)?;
        let paragraphs: Vec<&str> = if body.is_empty() {
            Vec::new()
        } else {
            split_paragraphs(body).collect()
        };
        let bytes = docx::build(&title, &paragraphs)?;
        self.persist(user_id, title, None, &bytes)
    }

    /// Runs the PDF through OCR (auto-detected languages, sidecar on) and
    /// turns the non-blank sidecar lines into a document. Fails with the
    /// job's error message when OCR fails.
    pub async fn convert_pdf(&self, user_id: &str, title: &str, upload: Upload) -> Result<WordDocument> {
        let title = validate_title(title)?;
        let submission = Submission::new(upload).auto_detect().options(OcrOptions {
            make_sidecar: true,
            ..OcrOptions::default()
        });
        let outcome = self.pipeline.submit(user_id, submission).await?;
        let job = outcome.job;

        if job.status() != JobStatus::Completed {
            let message = job.error_message().unwrap_or("OCR processing failed").to_string();
            return Err(WordError::ConversionFailed(message).into());
        }

        let text = match job.sidecar_file() {
            Some(sidecar) => String::from_utf8_lossy(&self.store.open(sidecar)?).into_owned(),
            None => String::new(),
        };
        let paragraphs: Vec<&str> = split_paragraphs(&text).filter(|l| !l.trim().is_empty()).collect();
        let bytes = docx::build(&title, &paragraphs)?;

        self.persist(user_id, title, Some(&job.source_file), &bytes)
    }

    pub fn documents(&self, user_id: &str) -> Result<Vec<WordDocument>> {
        Ok(word_repo::list_for_user(&self.db, user_id)?)
    }

    pub fn document(&self, user_id: &str, document_id: &str) -> Result<WordDocument> {
        match word_repo::find_by_id(&self.db, document_id)? {
            Some(doc) if doc.user_id == user_id => Ok(doc),
            _ => Err(WordError::NotFound(document_id.to_string()).into()),
        }
    }

    fn persist(
        &self,
        user_id: &str,
        title: String,
        source_pdf: Option<&ArtifactRef>,
        bytes: &[u8],
    ) -> Result<WordDocument> {
        let document_id = uuid::Uuid::new_v4().to_string();
        let filename = sanitize::sanitize_filename(&format!("{}.docx", title.replace([' ', '/', '\\'], "_")));

        let source_file = match source_pdf {
            Some(source) => Some(self.store.copy(source, Namespace::WordSources, &document_id)?),
            None => None,
        };
        let docx_file = match self
            .store
            .save(Namespace::WordDocuments, &document_id, &filename, bytes)
        {
            Ok(file) => file,
            Err(e) => {
                if let Some(source) = &source_file {
                    let _ = self.store.delete(source);
                }
                return Err(e.into());
            }
        };

        let now = Utc::now();
        let document = WordDocument {
            id: document_id,
            user_id: user_id.to_string(),
            title,
            source_file,
            docx_file,
            created_at: now,
            updated_at: now,
        };
        if let Err(e) = word_repo::insert(&self.db, &document) {
            let _ = self.store.delete(&document.docx_file);
            if let Some(source) = &document.source_file {
                let _ = self.store.delete(source);
            }
            return Err(e.into());
        }

        tracing::info!(document_id = %document.id, "Created Word document");
        Ok(document)
    }
}

/// Lines of `text`. Form feeds, which OCR sidecars put between pages, also
/// end a paragraph.
fn split_paragraphs(text: &str) -> impl Iterator<Item = &str> {
    text.lines().flat_map(|line| line.split('\u{c}'))
}

fn validate_title(title: &str) -> std::result::Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(title.to_string())
}
