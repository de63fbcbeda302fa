//! Word document repository: the `word_documents` table.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::{format_timestamp, parse_timestamp, Database, DatabaseError};
use crate::storage::ArtifactRef;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordDocument {
    pub id: String,
    pub user_id: String,
    pub title: String,
    /// Source PDF when the document came from a conversion.
    pub source_file: Option<ArtifactRef>,
    pub docx_file: ArtifactRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WordDocument {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let source_file: Option<String> = row.get("source_file")?;
        let docx_file: String = row.get("docx_file")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            title: row.get("title")?,
            source_file: source_file.map(ArtifactRef::from_key),
            docx_file: ArtifactRef::from_key(docx_file),
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }
}

pub fn insert(db: &Database, doc: &WordDocument) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO word_documents (id, user_id, title, source_file, docx_file, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                doc.id,
                doc.user_id,
                doc.title,
                doc.source_file.as_ref().map(|f| f.key()),
                doc.docx_file.key(),
                format_timestamp(&doc.created_at),
                format_timestamp(&doc.updated_at),
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<WordDocument>, DatabaseError> {
    db.with_conn(|conn| {
        let doc = conn
            .query_row(
                "SELECT * FROM word_documents WHERE id = ?1",
                params![id],
                WordDocument::from_row,
            )
            .optional()?;
        Ok(doc)
    })
}

/// A user's Word documents, newest first.
pub fn list_for_user(db: &Database, user_id: &str) -> Result<Vec<WordDocument>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM word_documents WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map(params![user_id], WordDocument::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
