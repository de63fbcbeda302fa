//! Copies a completed job's files into a library folder.

use std::sync::Arc;

use chrono::Utc;
use tracing::info_span;

use crate::db::document_repo::{self, ArchivedDocument};
use crate::db::folder_repo::Folder;
use crate::db::Database;
use crate::error::Result;
use crate::job::Job;
use crate::sanitize;
use crate::storage::{ArtifactRef, ArtifactStore, Namespace};

#[derive(Clone)]
pub struct ArchivalLinker {
    db: Database,
    store: Arc<dyn ArtifactStore>,
}

impl ArchivalLinker {
    pub fn new(db: Database, store: Arc<dyn ArtifactStore>) -> Self {
        Self { db, store }
    }

    /// Creates a document in `folder` holding copies of the job's source and
    /// processed files. The job itself is left untouched.
    ///
    /// Every call creates a new document. If a copy or the insert fails, the
    /// copies made so far are removed.
    pub fn archive(&self, job: &Job, folder: &Folder) -> Result<ArchivedDocument> {
        let document_id = uuid::Uuid::new_v4().to_string();
        let _span = info_span!("archive",
            job_id = %job.id,
            document_id = %document_id,
            folder_id = %folder.id,
        )
        .entered();

        let mut copied: Vec<ArtifactRef> = Vec::with_capacity(2);
        let result = self.copy_and_insert(job, folder, &document_id, &mut copied);
        if result.is_err() {
            for artifact in &copied {
                if let Err(e) = self.store.delete(artifact) {
                    tracing::warn!(artifact = %artifact, error = %e, "Failed to remove partial archive copy");
                }
            }
        }
        result
    }

    fn copy_and_insert(
        &self,
        job: &Job,
        folder: &Folder,
        document_id: &str,
        copied: &mut Vec<ArtifactRef>,
    ) -> Result<ArchivedDocument> {
        let original_file = self
            .store
            .copy(&job.source_file, Namespace::LibraryOriginals, document_id)?;
        copied.push(original_file.clone());

        let processed_file = match job.processed_file() {
            Some(processed) => {
                let copy = self
                    .store
                    .copy(processed, Namespace::LibraryProcessed, document_id)?;
                copied.push(copy.clone());
                Some(copy)
            }
            None => None,
        };

        let now = Utc::now();
        let document = ArchivedDocument {
            id: document_id.to_string(),
            user_id: folder.user_id.clone(),
            folder_id: folder.id.clone(),
            job_id: Some(job.id.clone()),
            title: sanitize::file_stem(job.source_filename()).to_string(),
            description: String::new(),
            original_file,
            processed_file,
            created_at: now,
            updated_at: now,
        };
        document_repo::insert(&self.db, &document)?;

        tracing::info!(title = %document.title, "Archived job output");
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::folder_repo;
    use crate::job::{LanguageSelection, OcrOptions};
    use crate::storage::MemoryStorage;

    fn setup() -> (Database, Arc<MemoryStorage>, Folder) {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        let folder = Folder {
            id: "f1".to_string(),
            user_id: "alice".to_string(),
            parent_id: None,
            name: "Inbox".to_string(),
            color: "mint".to_string(),
            description: String::new(),
            created_at: now,
            updated_at: now,
        };
        folder_repo::insert(&db, &folder).unwrap();
        (db, Arc::new(MemoryStorage::new()), folder)
    }

    fn completed_job(store: &MemoryStorage, with_processed_copy: bool) -> Job {
        let source = store
            .save(Namespace::Uploads, "j1", "Invoice 7.pdf", b"source")
            .unwrap();
        let processed = if with_processed_copy {
            store
                .save(Namespace::Processed, "j1", "Invoice 7_ocr.pdf", b"processed")
                .unwrap()
        } else {
            ArtifactRef::new(Namespace::Processed, "j1", "gone.pdf")
        };

        let mut job = Job::new(
            "j1".to_string(),
            "alice",
            LanguageSelection::Auto,
            OcrOptions::default(),
            Some("f1".to_string()),
            source,
        );
        job.begin_processing().unwrap();
        job.complete(processed, None, None).unwrap();
        job
    }

    #[test]
    fn test_archive_copies_both_files() {
        let (db, store, folder) = setup();
        let job = completed_job(&store, true);
        let linker = ArchivalLinker::new(db.clone(), store.clone());

        let doc = linker.archive(&job, &folder).unwrap();

        assert_eq!(doc.title, "Invoice 7");
        assert_eq!(doc.user_id, "alice");
        assert_eq!(doc.job_id.as_deref(), Some("j1"));
        assert_eq!(store.open(&doc.original_file).unwrap(), b"source");
        let processed = doc.processed_file.as_ref().unwrap();
        assert_eq!(processed.filename(), "Invoice 7_ocr.pdf");
        assert_eq!(store.open(processed).unwrap(), b"processed");
        assert!(document_repo::find_by_id(&db, &doc.id).unwrap().is_some());
    }

    #[test]
    fn test_failed_copy_removes_partial_copies() {
        let (db, store, folder) = setup();
        let job = completed_job(&store, false);
        let linker = ArchivalLinker::new(db.clone(), store.clone());
        let before = store.len();

        assert!(linker.archive(&job, &folder).is_err());
        assert_eq!(store.len(), before);
        assert!(document_repo::list_in_folder(&db, "f1").unwrap().is_empty());
    }
}
