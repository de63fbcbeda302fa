//! Folder repository: the per-user folder tree in the `folders` table.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::{format_timestamp, parse_timestamp, Database, DatabaseError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Folder {
    pub id: String,
    pub user_id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub color: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            parent_id: row.get("parent_id")?,
            name: row.get("name")?,
            color: row.get("color")?,
            description: row.get("description")?,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }
}

pub fn insert(db: &Database, folder: &Folder) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO folders (id, user_id, parent_id, name, color, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                folder.id,
                folder.user_id,
                folder.parent_id,
                folder.name,
                folder.color,
                folder.description,
                format_timestamp(&folder.created_at),
                format_timestamp(&folder.updated_at),
            ],
        )?;
        Ok(())
    })
}

/// Overwrites the mutable columns (parent, name, color, description).
pub fn update(db: &Database, folder: &Folder) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE folders SET parent_id=?2, name=?3, color=?4, description=?5, updated_at=?6
             WHERE id=?1",
            params![
                folder.id,
                folder.parent_id,
                folder.name,
                folder.color,
                folder.description,
                format_timestamp(&folder.updated_at),
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<Folder>, DatabaseError> {
    db.with_conn(|conn| {
        let folder = conn
            .query_row(
                "SELECT * FROM folders WHERE id = ?1",
                params![id],
                Folder::from_row,
            )
            .optional()?;
        Ok(folder)
    })
}

/// All folders of a user, ordered by name.
pub fn list_for_user(db: &Database, user_id: &str) -> Result<Vec<Folder>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM folders WHERE user_id = ?1 ORDER BY name COLLATE NOCASE, id")?;
        let rows = stmt
            .query_map(params![user_id], Folder::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Whether `name` is already used among the siblings under `parent_id`,
/// ignoring the folder `exclude_id` (the one being renamed or moved).
pub fn name_taken(
    db: &Database,
    user_id: &str,
    parent_id: Option<&str>,
    name: &str,
    exclude_id: Option<&str>,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM folders
             WHERE user_id = ?1 AND parent_id IS ?2 AND name = ?3 AND id IS NOT ?4",
            params![user_id, parent_id, name, exclude_id],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    })
}
