//! Job repository: CRUD operations for the `jobs` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw job row from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRow {
    pub id: String,
    pub user_id: String,
    pub auto_detect: bool,
    /// `+`-joined language codes; empty for auto-detect.
    pub languages: String,
    /// JSON-encoded option bag.
    pub options: String,
    pub destination_folder_id: Option<String>,
    pub status: String,
    pub source_file: String,
    pub processed_file: Option<String>,
    pub sidecar_file: Option<String>,
    pub error_message: Option<String>,
    pub detected_languages: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            auto_detect: row.get("auto_detect")?,
            languages: row.get("languages")?,
            options: row.get("options")?,
            destination_folder_id: row.get("destination_folder_id")?,
            status: row.get("status")?,
            source_file: row.get("source_file")?,
            processed_file: row.get("processed_file")?,
            sidecar_file: row.get("sidecar_file")?,
            error_message: row.get("error_message")?,
            detected_languages: row.get("detected_languages")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Query filter parameters for job listing.
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Inserts a new job row.
pub fn insert(db: &Database, job: &JobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO jobs (id, user_id, auto_detect, languages, options, destination_folder_id,
             status, source_file, processed_file, sidecar_file, error_message, detected_languages,
             created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                job.id,
                job.user_id,
                job.auto_detect,
                job.languages,
                job.options,
                job.destination_folder_id,
                job.status,
                job.source_file,
                job.processed_file,
                job.sidecar_file,
                job.error_message,
                job.detected_languages,
                job.created_at,
                job.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Updates an existing job row in a single statement. Owner, source file and
/// `created_at` never change.
pub fn update(db: &Database, job: &JobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE jobs SET auto_detect=?2, languages=?3, options=?4, destination_folder_id=?5,
             status=?6, processed_file=?7, sidecar_file=?8, error_message=?9,
             detected_languages=?10, updated_at=?11
             WHERE id=?1",
            params![
                job.id,
                job.auto_detect,
                job.languages,
                job.options,
                job.destination_folder_id,
                job.status,
                job.processed_file,
                job.sidecar_file,
                job.error_message,
                job.detected_languages,
                job.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a job by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM jobs WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], JobRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Queries jobs with filters, newest first, returning (rows, total_count).
pub fn query(db: &Database, filter: &JobFilter) -> Result<(Vec<JobRow>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref user_id) = filter.user_id {
            conditions.push(format!("user_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(user_id.clone()));
        }
        if let Some(ref status) = filter.status {
            conditions.push(format!("status = ?{}", param_values.len() + 1));
            param_values.push(Box::new(status.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM jobs {}", where_clause);
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

        let limit = filter.limit.unwrap_or(100) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));
        // rowid breaks ties between jobs created within the same instant.
        let query_sql = format!(
            "SELECT * FROM jobs {} ORDER BY created_at DESC, rowid DESC LIMIT ?{} OFFSET ?{}",
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<JobRow> = stmt
            .query_map(params_ref.as_slice(), JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}

/// Deletes a job row. Returns whether a row was removed.
pub fn delete(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    })
}
