//! User-owned folder trees and the documents filed in them.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::db::document_repo::{self, ArchivedDocument};
use crate::db::folder_repo::{self, Folder};
use crate::db::Database;
use crate::error::Result;
use crate::pipeline::Upload;
use crate::sanitize;
use crate::storage::{ArtifactStore, Namespace};

pub const DEFAULT_FOLDER_COLOR: &str = "mint";
const MAX_FOLDER_NAME_CHARS: usize = 120;
const MAX_TITLE_CHARS: usize = 150;
const MAX_DESCRIPTION_CHARS: usize = 255;
const MAX_COLOR_CHARS: usize = 24;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LibraryError {
    #[error("Folder '{0}' not found")]
    FolderNotFound(String),

    #[error("Document '{0}' not found")]
    DocumentNotFound(String),

    #[error("A folder named '{0}' already exists here")]
    DuplicateName(String),

    #[error("Invalid folder name: {0}")]
    InvalidName(String),

    #[error("Invalid color token '{0}'")]
    InvalidColor(String),

    #[error("A folder cannot be moved into itself or one of its subfolders")]
    Cycle,

    #[error("Text is too long: {field} allows at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Input for [`Library::create_folder`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewFolder {
    pub name: String,
    pub parent_id: Option<String>,
    pub color: Option<String>,
    pub description: String,
}

impl NewFolder {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn under(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

#[derive(Clone)]
pub struct Library {
    db: Database,
    store: Arc<dyn ArtifactStore>,
}

impl Library {
    pub fn new(db: Database, store: Arc<dyn ArtifactStore>) -> Self {
        Self { db, store }
    }

    pub fn create_folder(&self, user_id: &str, new: NewFolder) -> Result<Folder> {
        let name = validate_name(&new.name)?;
        let color = validate_color(new.color.as_deref())?;
        let description = validate_length(new.description.trim(), "description", MAX_DESCRIPTION_CHARS)?;
        if let Some(parent_id) = &new.parent_id {
            self.folder(user_id, parent_id)?;
        }
        self.ensure_unique(user_id, new.parent_id.as_deref(), &name, None)?;

        let now = Utc::now();
        let folder = Folder {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            parent_id: new.parent_id,
            name,
            color,
            description,
            created_at: now,
            updated_at: now,
        };
        folder_repo::insert(&self.db, &folder)?;
        tracing::info!(folder_id = %folder.id, "Created folder");
        Ok(folder)
    }

    pub fn rename_folder(&self, user_id: &str, folder_id: &str, name: &str) -> Result<Folder> {
        let mut folder = self.folder(user_id, folder_id)?;
        let name = validate_name(name)?;
        self.ensure_unique(user_id, folder.parent_id.as_deref(), &name, Some(folder.id.as_str()))?;

        folder.name = name;
        folder.updated_at = Utc::now();
        folder_repo::update(&self.db, &folder)?;
        Ok(folder)
    }

    /// Re-parents a folder (`None` moves it to the root level). The new
    /// parent must belong to the same user and must not be the folder itself
    /// or one of its descendants.
    pub fn move_folder(&self, user_id: &str, folder_id: &str, new_parent: Option<&str>) -> Result<Folder> {
        let mut folder = self.folder(user_id, folder_id)?;

        if let Some(parent_id) = new_parent {
            self.folder(user_id, parent_id)?;
            if self.is_self_or_descendant(&folder.id, parent_id)? {
                return Err(LibraryError::Cycle.into());
            }
        }
        self.ensure_unique(user_id, new_parent, &folder.name, Some(folder.id.as_str()))?;

        folder.parent_id = new_parent.map(str::to_string);
        folder.updated_at = Utc::now();
        folder_repo::update(&self.db, &folder)?;
        Ok(folder)
    }

    pub fn folders(&self, user_id: &str) -> Result<Vec<Folder>> {
        Ok(folder_repo::list_for_user(&self.db, user_id)?)
    }

    /// A folder owned by `user_id`. Other users' folders are reported as
    /// missing.
    pub fn folder(&self, user_id: &str, folder_id: &str) -> Result<Folder> {
        match folder_repo::find_by_id(&self.db, folder_id)? {
            Some(folder) if folder.user_id == user_id => Ok(folder),
            _ => Err(LibraryError::FolderNotFound(folder_id.to_string()).into()),
        }
    }

    pub fn documents(&self, user_id: &str, folder_id: &str) -> Result<Vec<ArchivedDocument>> {
        let folder = self.folder(user_id, folder_id)?;
        Ok(document_repo::list_in_folder(&self.db, &folder.id)?)
    }

    /// All of a user's documents, newest first.
    pub fn recent_documents(&self, user_id: &str, limit: Option<u64>) -> Result<Vec<ArchivedDocument>> {
        Ok(document_repo::list_for_user(&self.db, user_id, limit)?)
    }

    pub fn document(&self, user_id: &str, document_id: &str) -> Result<ArchivedDocument> {
        match document_repo::find_by_id(&self.db, document_id)? {
            Some(doc) if doc.user_id == user_id => Ok(doc),
            _ => Err(LibraryError::DocumentNotFound(document_id.to_string()).into()),
        }
    }

    /// Files a PDF directly into a folder, without OCR. An empty title falls
    /// back to the filename stem.
    pub fn add_document(
        &self,
        user_id: &str,
        folder_id: &str,
        title: &str,
        description: &str,
        upload: Upload,
    ) -> Result<ArchivedDocument> {
        let folder = self.folder(user_id, folder_id)?;
        upload.validate_pdf()?;

        let filename = sanitize::sanitize_filename(&upload.filename);
        let title = match title.trim() {
            "" => sanitize::file_stem(&filename).to_string(),
            t => t.to_string(),
        };
        let title = validate_length(&title, "title", MAX_TITLE_CHARS)?;
        let description = validate_length(description.trim(), "description", MAX_DESCRIPTION_CHARS)?;

        let document_id = uuid::Uuid::new_v4().to_string();
        let original_file =
            self.store
                .save(Namespace::LibraryOriginals, &document_id, &filename, &upload.bytes)?;

        let now = Utc::now();
        let document = ArchivedDocument {
            id: document_id,
            user_id: user_id.to_string(),
            folder_id: folder.id,
            job_id: None,
            title,
            description,
            original_file,
            processed_file: None,
            created_at: now,
            updated_at: now,
        };
        if let Err(e) = document_repo::insert(&self.db, &document) {
            let _ = self.store.delete(&document.original_file);
            return Err(e.into());
        }
        Ok(document)
    }

    fn ensure_unique(
        &self,
        user_id: &str,
        parent_id: Option<&str>,
        name: &str,
        exclude_id: Option<&str>,
    ) -> Result<()> {
        if folder_repo::name_taken(&self.db, user_id, parent_id, name, exclude_id)? {
            return Err(LibraryError::DuplicateName(name.to_string()).into());
        }
        Ok(())
    }

    /// Walks up from `candidate` to the root looking for `folder_id`.
    fn is_self_or_descendant(&self, folder_id: &str, candidate: &str) -> Result<bool> {
        let mut current = Some(candidate.to_string());
        let mut steps = 0usize;
        while let Some(id) = current {
            if id == folder_id {
                return Ok(true);
            }
            // A stored cycle would otherwise loop forever.
            steps += 1;
            if steps > 10_000 {
                return Ok(true);
            }
            current = folder_repo::find_by_id(&self.db, &id)?.and_then(|f| f.parent_id);
        }
        Ok(false)
    }
}

fn validate_name(name: &str) -> std::result::Result<String, LibraryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LibraryError::InvalidName("name must not be empty".to_string()));
    }
    if name.contains(['/', '\\']) || name.chars().any(char::is_control) {
        return Err(LibraryError::InvalidName(format!(
            "'{}' contains path separators or control characters",
            name
        )));
    }
    validate_length(name, "name", MAX_FOLDER_NAME_CHARS)
}

fn validate_color(color: Option<&str>) -> std::result::Result<String, LibraryError> {
    let color = match color.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_FOLDER_COLOR.to_string()),
        Some(c) => c,
    };
    let well_formed = color.chars().count() <= MAX_COLOR_CHARS
        && color.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if well_formed {
        Ok(color.to_ascii_lowercase())
    } else {
        Err(LibraryError::InvalidColor(color.to_string()))
    }
}

fn validate_length(value: &str, field: &'static str, max: usize) -> std::result::Result<String, LibraryError> {
    if value.chars().count() > max {
        return Err(LibraryError::TooLong { field, max });
    }
    Ok(value.to_string())
}
