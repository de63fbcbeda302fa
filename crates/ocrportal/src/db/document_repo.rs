//! Archived document repository: the `documents` table.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::{format_timestamp, parse_timestamp, Database, DatabaseError};
use crate::storage::ArtifactRef;

/// A library entry holding copies of a job's files (or a manual upload).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchivedDocument {
    pub id: String,
    pub user_id: String,
    pub folder_id: String,
    /// Producing job; cleared when the job is deleted.
    pub job_id: Option<String>,
    pub title: String,
    pub description: String,
    pub original_file: ArtifactRef,
    pub processed_file: Option<ArtifactRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ArchivedDocument {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let original_file: String = row.get("original_file")?;
        let processed_file: Option<String> = row.get("processed_file")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            folder_id: row.get("folder_id")?,
            job_id: row.get("job_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            original_file: ArtifactRef::from_key(original_file),
            processed_file: processed_file.map(ArtifactRef::from_key),
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }
}

pub fn insert(db: &Database, doc: &ArchivedDocument) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO documents (id, user_id, folder_id, job_id, title, description,
             original_file, processed_file, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                doc.id,
                doc.user_id,
                doc.folder_id,
                doc.job_id,
                doc.title,
                doc.description,
                doc.original_file.key(),
                doc.processed_file.as_ref().map(|f| f.key()),
                format_timestamp(&doc.created_at),
                format_timestamp(&doc.updated_at),
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<ArchivedDocument>, DatabaseError> {
    db.with_conn(|conn| {
        let doc = conn
            .query_row(
                "SELECT * FROM documents WHERE id = ?1",
                params![id],
                ArchivedDocument::from_row,
            )
            .optional()?;
        Ok(doc)
    })
}

/// Documents in one folder, by title.
pub fn list_in_folder(db: &Database, folder_id: &str) -> Result<Vec<ArchivedDocument>, DatabaseError> {
    list_where(db, "folder_id = ?1", BY_TITLE, folder_id, None)
}

/// A user's documents across all folders, newest first.
pub fn list_for_user(
    db: &Database,
    user_id: &str,
    limit: Option<u64>,
) -> Result<Vec<ArchivedDocument>, DatabaseError> {
    list_where(db, "user_id = ?1", NEWEST_FIRST, user_id, limit)
}

/// Documents archived from a given job.
pub fn list_for_job(db: &Database, job_id: &str) -> Result<Vec<ArchivedDocument>, DatabaseError> {
    list_where(db, "job_id = ?1", NEWEST_FIRST, job_id, None)
}

const BY_TITLE: &str = "title COLLATE NOCASE, created_at DESC";
// rowid breaks ties between rows created within the same instant.
const NEWEST_FIRST: &str = "created_at DESC, rowid DESC";

fn list_where(
    db: &Database,
    condition: &str,
    order: &str,
    value: &str,
    limit: Option<u64>,
) -> Result<Vec<ArchivedDocument>, DatabaseError> {
    db.with_conn(|conn| {
        let sql = format!(
            "SELECT * FROM documents WHERE {} ORDER BY {} LIMIT ?2",
            condition, order
        );
        // SQLite treats a negative LIMIT as unbounded.
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![value, limit], ArchivedDocument::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
