//! Settings repository: the singleton row (id = 1) of the `settings` table.

use rusqlite::{params, OptionalExtension};

use super::{Database, DatabaseError};

/// The raw settings row.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsRow {
    pub engine: String,
    pub updated_at: String,
}

/// Creates the singleton with `engine` unless it already exists, then returns
/// the stored row.
pub fn get_or_create(
    db: &Database,
    engine: &str,
    now: &str,
) -> Result<SettingsRow, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT OR IGNORE INTO settings (id, engine, updated_at) VALUES (1, ?1, ?2)",
            params![engine, now],
        )?;
        let row = conn.query_row(
            "SELECT engine, updated_at FROM settings WHERE id = 1",
            [],
            |r| {
                Ok(SettingsRow {
                    engine: r.get(0)?,
                    updated_at: r.get(1)?,
                })
            },
        )?;
        Ok(row)
    })
}

/// Reads the singleton without creating it.
pub fn find(db: &Database) -> Result<Option<SettingsRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT engine, updated_at FROM settings WHERE id = 1",
                [],
                |r| {
                    Ok(SettingsRow {
                        engine: r.get(0)?,
                        updated_at: r.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    })
}

/// Stores the selected engine, creating the singleton if needed.
pub fn set_engine(db: &Database, engine: &str, now: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO settings (id, engine, updated_at) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET engine = excluded.engine, updated_at = excluded.updated_at",
            params![engine, now],
        )?;
        Ok(())
    })
}
