//! The OCR job record and its lifecycle.
//!
//! Status and file references are private so they can only change through the
//! transition methods, which keep them consistent: a completed job always has
//! a processed file and no error, a failed job always has an error and no
//! output files.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::job_repo::JobRow;
use crate::db::{format_timestamp, parse_timestamp, DatabaseError};
use crate::error::ValidationError;
use crate::storage::ArtifactRef;

/// Languages offered by the portal, with display labels.
pub const LANGUAGE_CATALOGUE: &[(&str, &str)] = &[
    ("ron", "Romanian"),
    ("eng", "English"),
    ("fra", "French"),
    ("deu", "German"),
    ("ita", "Italian"),
    ("spa", "Spanish"),
    ("hun", "Hungarian"),
    ("pol", "Polish"),
    ("ukr", "Ukrainian"),
];

const AUTO_DETECT_LABEL: &str = "Automatic detection";

/// Returns the display label for a language code, or the code itself.
pub fn language_label(code: &str) -> &str {
    LANGUAGE_CATALOGUE
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
        .unwrap_or(code)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("Invalid job transition from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("Unknown job status '{0}'")]
    UnknownStatus(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, JobError> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(JobError::UnknownStatus(other.to_string())),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The OCR backends a job can be dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Classical recognition through OCRmyPDF/Tesseract.
    #[default]
    Ocrmypdf,
    /// Structured document conversion through Docling.
    Docling,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Ocrmypdf => "ocrmypdf",
            EngineKind::Docling => "docling",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ocrmypdf" => Some(EngineKind::Ocrmypdf),
            "docling" => Some(EngineKind::Docling),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EngineKind::Ocrmypdf => "OCRmyPDF",
            EngineKind::Docling => "Docling",
        }
    }

    /// Suffix of processed filenames: `<stem>_<suffix>.pdf`.
    pub fn output_suffix(&self) -> &'static str {
        match self {
            EngineKind::Ocrmypdf => "ocr",
            EngineKind::Docling => "docling",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output document flavour requested from the classical engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputType {
    #[default]
    #[serde(rename = "pdfa")]
    Pdfa,
    #[serde(rename = "pdf")]
    Pdf,
    #[serde(rename = "pdfa-1")]
    Pdfa1,
    #[serde(rename = "pdfa-2")]
    Pdfa2,
    #[serde(rename = "pdfa-3")]
    Pdfa3,
}

impl OutputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputType::Pdfa => "pdfa",
            OutputType::Pdf => "pdf",
            OutputType::Pdfa1 => "pdfa-1",
            OutputType::Pdfa2 => "pdfa-2",
            OutputType::Pdfa3 => "pdfa-3",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdfa" => Some(OutputType::Pdfa),
            "pdf" => Some(OutputType::Pdf),
            "pdfa-1" => Some(OutputType::Pdfa1),
            "pdfa-2" => Some(OutputType::Pdfa2),
            "pdfa-3" => Some(OutputType::Pdfa3),
            _ => None,
        }
    }
}

/// Either engine-side detection or an explicit, non-empty ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageSelection {
    Auto,
    Explicit(Vec<String>),
}

impl LanguageSelection {
    /// Builds a selection from form input. Codes are ignored when
    /// `auto_detect` is set.
    pub fn from_request(auto_detect: bool, codes: &[String]) -> Result<Self, ValidationError> {
        if auto_detect {
            return Ok(LanguageSelection::Auto);
        }
        Self::explicit(codes)
    }

    pub fn explicit(codes: &[String]) -> Result<Self, ValidationError> {
        let mut cleaned: Vec<String> = Vec::with_capacity(codes.len());
        for code in codes {
            let code = code.trim();
            if code.is_empty() {
                continue;
            }
            validate_language_code(code)?;
            if !cleaned.iter().any(|c| c == code) {
                cleaned.push(code.to_string());
            }
        }

        if cleaned.is_empty() {
            return Err(ValidationError::MissingLanguages);
        }
        Ok(LanguageSelection::Explicit(cleaned))
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, LanguageSelection::Auto)
    }

    pub fn codes(&self) -> &[String] {
        match self {
            LanguageSelection::Auto => &[],
            LanguageSelection::Explicit(codes) => codes,
        }
    }

    /// The `+`-joined form used by Tesseract, `None` for auto-detect.
    pub fn joined(&self) -> Option<String> {
        match self {
            LanguageSelection::Auto => None,
            LanguageSelection::Explicit(codes) => Some(codes.join("+")),
        }
    }
}

/// Tesseract language codes are short identifiers such as `eng` or `chi_sim`.
fn validate_language_code(code: &str) -> Result<(), ValidationError> {
    let well_formed = code.len() <= 20
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::InvalidLanguage(code.to_string()))
    }
}

/// Free-form option bag passed to the engine, persisted as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrOptions {
    pub optimize: u8,
    pub deskew: bool,
    pub rotate_pages: bool,
    pub remove_background: bool,
    pub clean_final: bool,
    pub skip_text: bool,
    pub force_ocr: bool,
    pub output_type: OutputType,
    pub make_sidecar: bool,
    /// Engine the job was dispatched to, recorded for auditability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineKind>,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            optimize: 1,
            deskew: false,
            rotate_pages: false,
            remove_background: false,
            clean_final: false,
            skip_text: false,
            force_ocr: false,
            output_type: OutputType::Pdfa,
            make_sidecar: false,
            engine: None,
        }
    }
}

impl OcrOptions {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.optimize > 3 {
            return Err(ValidationError::OptimizeOutOfRange(self.optimize));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: String,
    pub user_id: String,
    pub languages: LanguageSelection,
    pub options: OcrOptions,
    pub destination_folder_id: Option<String>,
    pub source_file: ArtifactRef,
    status: JobStatus,
    processed_file: Option<ArtifactRef>,
    sidecar_file: Option<ArtifactRef>,
    error_message: Option<String>,
    detected_languages: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Creates a pending job. `source_file` must already be stored.
    pub fn new(
        id: String,
        user_id: impl Into<String>,
        languages: LanguageSelection,
        options: OcrOptions,
        destination_folder_id: Option<String>,
        source_file: ArtifactRef,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id: user_id.into(),
            languages,
            options,
            destination_folder_id,
            source_file,
            status: JobStatus::Pending,
            processed_file: None,
            sidecar_file: None,
            error_message: None,
            detected_languages: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a job from persisted parts, checking the status/file invariant.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        mut base: Job,
        status: JobStatus,
        processed_file: Option<ArtifactRef>,
        sidecar_file: Option<ArtifactRef>,
        error_message: Option<String>,
        detected_languages: Option<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let consistent = match status {
            JobStatus::Completed => processed_file.is_some() && error_message.is_none(),
            JobStatus::Failed => processed_file.is_none() && error_message.is_some(),
            JobStatus::Pending | JobStatus::Processing => {
                processed_file.is_none() && error_message.is_none()
            }
        };
        if !consistent {
            log::warn!(
                "Job {} was stored as {} with inconsistent files/error",
                base.id,
                status
            );
        }

        base.status = status;
        base.processed_file = processed_file;
        base.sidecar_file = sidecar_file;
        base.error_message = error_message;
        base.detected_languages = detected_languages;
        base.updated_at = updated_at;
        base
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn processed_file(&self) -> Option<&ArtifactRef> {
        self.processed_file.as_ref()
    }

    pub fn sidecar_file(&self) -> Option<&ArtifactRef> {
        self.sidecar_file.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn detected_languages(&self) -> Option<&str> {
        self.detected_languages.as_deref()
    }

    /// Engine recorded at dispatch, if the job got that far.
    pub fn engine(&self) -> Option<EngineKind> {
        self.options.engine
    }

    /// Original upload name (last component of the source key).
    pub fn source_filename(&self) -> &str {
        self.source_file.filename()
    }

    pub fn begin_processing(&mut self) -> Result<(), JobError> {
        self.transition(JobStatus::Processing)?;
        Ok(())
    }

    /// Moves a processing job to `completed` together with its outputs.
    ///
    /// Returns the sidecar reference the job held before, if it was replaced
    /// or dropped, so the caller can delete the stale artifact.
    pub fn complete(
        &mut self,
        processed_file: ArtifactRef,
        sidecar_file: Option<ArtifactRef>,
        detected_languages: Option<String>,
    ) -> Result<Option<ArtifactRef>, JobError> {
        self.transition(JobStatus::Completed)?;
        let stale_sidecar = match (&self.sidecar_file, &sidecar_file) {
            (Some(old), Some(new)) if old == new => None,
            _ => self.sidecar_file.take(),
        };
        self.processed_file = Some(processed_file);
        self.sidecar_file = sidecar_file;
        self.error_message = None;
        self.detected_languages = if self.languages.is_auto() {
            detected_languages.filter(|d| !d.trim().is_empty())
        } else {
            None
        };
        Ok(stale_sidecar)
    }

    /// Moves a processing job to `failed`. Output references are dropped and
    /// returned so the caller can delete them.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<Vec<ArtifactRef>, JobError> {
        self.transition(JobStatus::Failed)?;
        let mut message = message.into();
        if message.trim().is_empty() {
            message = "OCR processing failed".to_string();
        }
        self.error_message = Some(message);
        Ok(self
            .processed_file
            .take()
            .into_iter()
            .chain(self.sidecar_file.take())
            .collect())
    }

    fn transition(&mut self, to: JobStatus) -> Result<(), JobError> {
        let allowed = !self.status.is_terminal()
            && matches!(
                (self.status, to),
                (JobStatus::Pending, JobStatus::Processing)
                    | (JobStatus::Processing, JobStatus::Completed)
                    | (JobStatus::Processing, JobStatus::Failed)
            );
        if !allowed {
            return Err(JobError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Human-readable language summary for listings.
    pub fn language_labels(&self) -> String {
        match &self.languages {
            LanguageSelection::Auto => self
                .detected_languages
                .clone()
                .unwrap_or_else(|| AUTO_DETECT_LABEL.to_string()),
            LanguageSelection::Explicit(codes) => codes
                .iter()
                .map(|c| language_label(c))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl Job {
    pub(crate) fn to_row(&self) -> JobRow {
        JobRow {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            auto_detect: self.languages.is_auto(),
            languages: self.languages.joined().unwrap_or_default(),
            // A flat struct of scalars always serializes.
            options: serde_json::to_string(&self.options).unwrap_or_else(|_| "{}".to_string()),
            destination_folder_id: self.destination_folder_id.clone(),
            status: self.status.as_str().to_string(),
            source_file: self.source_file.key().to_string(),
            processed_file: self.processed_file.as_ref().map(|f| f.key().to_string()),
            sidecar_file: self.sidecar_file.as_ref().map(|f| f.key().to_string()),
            error_message: self.error_message.clone(),
            detected_languages: self.detected_languages.clone(),
            created_at: format_timestamp(&self.created_at),
            updated_at: format_timestamp(&self.updated_at),
        }
    }
}

impl TryFrom<JobRow> for Job {
    type Error = DatabaseError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let corrupt = |column: &'static str, reason: String| DatabaseError::Corrupt {
            id: row.id.clone(),
            column,
            reason,
        };

        let status = JobStatus::parse(&row.status).map_err(|e| corrupt("status", e.to_string()))?;
        let options: OcrOptions =
            serde_json::from_str(&row.options).map_err(|e| corrupt("options", e.to_string()))?;
        let languages = if row.auto_detect {
            LanguageSelection::Auto
        } else {
            let codes: Vec<String> = row.languages.split('+').map(str::to_string).collect();
            LanguageSelection::explicit(&codes).map_err(|e| corrupt("languages", e.to_string()))?
        };

        let base = Job {
            id: row.id.clone(),
            user_id: row.user_id.clone(),
            languages,
            options,
            destination_folder_id: row.destination_folder_id.clone(),
            source_file: ArtifactRef::from_key(row.source_file.clone()),
            status: JobStatus::Pending,
            processed_file: None,
            sidecar_file: None,
            error_message: None,
            detected_languages: None,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.created_at),
        };

        Ok(Job::restore(
            base,
            status,
            row.processed_file.map(ArtifactRef::from_key),
            row.sidecar_file.map(ArtifactRef::from_key),
            row.error_message,
            row.detected_languages,
            parse_timestamp(&row.updated_at),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Namespace;

    #[test]
    fn test_output_type_parse() {
        assert_eq!(OutputType::parse("PDFA-2"), Some(OutputType::Pdfa2));
        assert_eq!(OutputType::parse("pdf"), Some(OutputType::Pdf));
        assert_eq!(OutputType::parse("tiff"), None);
    }

    fn pending_job(languages: LanguageSelection) -> Job {
        Job::new(
            "job-1".to_string(),
            "user-1",
            languages,
            OcrOptions::default(),
            None,
            ArtifactRef::new(Namespace::Uploads, "job-1", "scan.pdf"),
        )
    }

    fn processed() -> ArtifactRef {
        ArtifactRef::new(Namespace::Processed, "job-1", "scan_ocr.pdf")
    }

    #[test]
    fn test_language_selection_requires_codes_without_auto() {
        assert_eq!(
            LanguageSelection::from_request(false, &[]),
            Err(ValidationError::MissingLanguages)
        );
        assert_eq!(
            LanguageSelection::from_request(false, &["  ".to_string()]),
            Err(ValidationError::MissingLanguages)
        );
    }

    #[test]
    fn test_language_selection_auto_ignores_codes() {
        let selection = LanguageSelection::from_request(true, &["eng".to_string()]).unwrap();
        assert!(selection.is_auto());
        assert_eq!(selection.joined(), None);
    }

    #[test]
    fn test_language_selection_keeps_order_and_dedups() {
        let codes = vec!["ron".to_string(), "eng".to_string(), "ron".to_string()];
        let selection = LanguageSelection::from_request(false, &codes).unwrap();
        assert_eq!(selection.codes(), ["ron".to_string(), "eng".to_string()]);
        assert_eq!(selection.joined().as_deref(), Some("ron+eng"));
    }

    #[test]
    fn test_language_selection_rejects_injection() {
        let codes = vec!["eng --force-ocr".to_string()];
        assert!(matches!(
            LanguageSelection::from_request(false, &codes),
            Err(ValidationError::InvalidLanguage(_))
        ));
    }

    #[test]
    fn test_options_default_and_validation() {
        let options = OcrOptions::default();
        assert_eq!(options.optimize, 1);
        assert_eq!(options.output_type, OutputType::Pdfa);
        assert!(options.validate().is_ok());

        let too_high = OcrOptions {
            optimize: 4,
            ..OcrOptions::default()
        };
        assert_eq!(too_high.validate(), Err(ValidationError::OptimizeOutOfRange(4)));
    }

    #[test]
    fn test_options_json_shape() {
        let options = OcrOptions {
            output_type: OutputType::Pdfa2,
            engine: Some(EngineKind::Docling),
            ..OcrOptions::default()
        };
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["output_type"], "pdfa-2");
        assert_eq!(json["engine"], "docling");

        // Missing keys fall back to defaults.
        let parsed: OcrOptions = serde_json::from_str(r#"{"make_sidecar": true}"#).unwrap();
        assert!(parsed.make_sidecar);
        assert_eq!(parsed.optimize, 1);
        assert_eq!(parsed.engine, None);
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut job = pending_job(LanguageSelection::Auto);
        assert_eq!(job.status(), JobStatus::Pending);

        job.begin_processing().unwrap();
        assert_eq!(job.status(), JobStatus::Processing);

        let stale = job
            .complete(processed(), None, Some("English".to_string()))
            .unwrap();
        assert!(stale.is_none());
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.processed_file(), Some(&processed()));
        assert_eq!(job.error_message(), None);
        assert_eq!(job.detected_languages(), Some("English"));
    }

    #[test]
    fn test_detected_languages_only_kept_for_auto() {
        let mut job = pending_job(LanguageSelection::Explicit(vec!["eng".to_string()]));
        job.begin_processing().unwrap();
        job.complete(processed(), None, Some("English".to_string()))
            .unwrap();
        assert_eq!(job.detected_languages(), None);
        assert_eq!(job.language_labels(), "English");
    }

    #[test]
    fn test_fail_records_message_and_drops_outputs() {
        let mut job = pending_job(LanguageSelection::Auto);
        job.begin_processing().unwrap();

        let dropped = job.fail("page already has text").unwrap();
        assert!(dropped.is_empty());
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.error_message(), Some("page already has text"));
        assert!(job.processed_file().is_none());
    }

    #[test]
    fn test_fail_with_empty_message_gets_generic_text() {
        let mut job = pending_job(LanguageSelection::Auto);
        job.begin_processing().unwrap();
        job.fail("   ").unwrap();
        assert_eq!(job.error_message(), Some("OCR processing failed"));
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut job = pending_job(LanguageSelection::Auto);
        job.begin_processing().unwrap();
        job.fail("boom").unwrap();

        assert_eq!(
            job.begin_processing(),
            Err(JobError::InvalidTransition {
                from: JobStatus::Failed,
                to: JobStatus::Processing
            })
        );
        assert!(job.complete(processed(), None, None).is_err());
        assert_eq!(job.status(), JobStatus::Failed);
    }

    #[test]
    fn test_completed_job_cannot_fail() {
        let mut job = pending_job(LanguageSelection::Auto);
        job.begin_processing().unwrap();
        job.complete(processed(), None, None).unwrap();
        assert!(job.status().is_terminal());

        assert_eq!(
            job.fail("late error"),
            Err(JobError::InvalidTransition {
                from: JobStatus::Completed,
                to: JobStatus::Failed
            })
        );
        assert_eq!(job.processed_file(), Some(&processed()));
        assert_eq!(job.error_message(), None);
    }

    #[test]
    fn test_cannot_complete_without_processing() {
        let mut job = pending_job(LanguageSelection::Auto);
        assert!(job.complete(processed(), None, None).is_err());
        assert!(job.fail("nope").is_err());
    }

    #[test]
    fn test_complete_returns_stale_sidecar() {
        let old_sidecar = ArtifactRef::new(Namespace::Sidecars, "job-1", "scan.txt");
        let mut job = pending_job(LanguageSelection::Auto);
        job.sidecar_file = Some(old_sidecar.clone());
        job.begin_processing().unwrap();

        let stale = job.complete(processed(), None, None).unwrap();
        assert_eq!(stale, Some(old_sidecar));
        assert!(job.sidecar_file().is_none());
    }

    #[test]
    fn test_language_labels() {
        let job = pending_job(LanguageSelection::Explicit(vec![
            "ron".to_string(),
            "xyz".to_string(),
        ]));
        assert_eq!(job.language_labels(), "Romanian, xyz");

        let auto = pending_job(LanguageSelection::Auto);
        assert_eq!(auto.language_labels(), "Automatic detection");
    }

    #[test]
    fn test_row_conversion_preserves_state() {
        let mut job = pending_job(LanguageSelection::Explicit(vec![
            "ron".to_string(),
            "eng".to_string(),
        ]));
        job.options.make_sidecar = true;
        job.options.engine = Some(EngineKind::Ocrmypdf);
        job.begin_processing().unwrap();
        job.complete(
            processed(),
            Some(ArtifactRef::new(Namespace::Sidecars, "job-1", "scan.txt")),
            None,
        )
        .unwrap();

        let row = job.to_row();
        assert_eq!(row.languages, "ron+eng");
        assert!(!row.auto_detect);
        assert_eq!(row.status, "completed");

        let restored = Job::try_from(row).unwrap();
        assert_eq!(restored, job);
    }

    #[test]
    fn test_row_with_unknown_status_is_corrupt() {
        let mut row = pending_job(LanguageSelection::Auto).to_row();
        row.status = "queued".to_string();
        assert!(matches!(
            Job::try_from(row),
            Err(DatabaseError::Corrupt { column: "status", .. })
        ));
    }

    #[test]
    fn test_engine_kind_parse_and_suffix() {
        assert_eq!(EngineKind::parse("OCRmyPDF"), Some(EngineKind::Ocrmypdf));
        assert_eq!(EngineKind::parse("docling"), Some(EngineKind::Docling));
        assert_eq!(EngineKind::parse("tesseract"), None);
        assert_eq!(EngineKind::Ocrmypdf.output_suffix(), "ocr");
        assert_eq!(EngineKind::Docling.output_suffix(), "docling");
    }
}
