use std::path::Path;

use crate::error::ValidationError;
use crate::job::OcrOptions;

/// Content types accepted for PDF uploads besides a missing one.
const ACCEPTED_CONTENT_TYPES: &[&str] = &["application/pdf", "application/octet-stream"];

/// An uploaded file as received from the front end.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            bytes,
        }
    }

    /// Upload with the content type guessed from the filename.
    pub fn from_filename(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = mime_guess::from_path(&filename)
            .first()
            .map(|m| m.essence_str().to_string());
        Self::new(filename, content_type, bytes)
    }

    /// Accepts `.pdf` files with a PDF-compatible (or absent) content type.
    pub fn validate_pdf(&self) -> Result<(), ValidationError> {
        let is_pdf_name = Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if !is_pdf_name {
            return Err(ValidationError::NotPdf(self.filename.clone()));
        }

        if let Some(content_type) = &self.content_type {
            let essence = content_type
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();
            if !ACCEPTED_CONTENT_TYPES.contains(&essence.as_str()) {
                return Err(ValidationError::UnsupportedContentType(content_type.clone()));
            }
        }

        if self.bytes.is_empty() {
            return Err(ValidationError::EmptyUpload);
        }
        Ok(())
    }
}

/// Everything a user submits with an OCR request.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub upload: Upload,
    pub auto_detect: bool,
    /// Ignored when `auto_detect` is set.
    pub languages: Vec<String>,
    pub options: OcrOptions,
    pub destination_folder_id: Option<String>,
}

impl Submission {
    pub fn new(upload: Upload) -> Self {
        Self {
            upload,
            auto_detect: false,
            languages: Vec::new(),
            options: OcrOptions::default(),
            destination_folder_id: None,
        }
    }

    pub fn auto_detect(mut self) -> Self {
        self.auto_detect = true;
        self
    }

    pub fn languages<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn options(mut self, options: OcrOptions) -> Self {
        self.options = options;
        self
    }

    pub fn destination(mut self, folder_id: impl Into<String>) -> Self {
        self.destination_folder_id = Some(folder_id.into());
        self
    }
}
