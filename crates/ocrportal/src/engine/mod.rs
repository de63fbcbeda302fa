//! OCR backends.
//!
//! Both engines are external programs driven through `tokio::process`; each
//! invocation gets its own [`ScratchArea`]. The child process is killed when the
//! engine future is dropped, so an outer timeout cancels the work.

pub mod capabilities;
pub mod docling;
pub mod error;
pub mod markdown;
pub mod ocrmypdf;
pub mod scratch;

use std::sync::Arc;

use async_trait::async_trait;

use crate::job::{EngineKind, LanguageSelection, OcrOptions};

pub use capabilities::{BackendProbe, CapabilityRegistry, CommandProbe, ProbeOutcome, StaticProbe};
pub use docling::DoclingEngine;
pub use error::EngineError;
pub use ocrmypdf::OcrmypdfEngine;
pub use scratch::ScratchArea;

/// What the pipeline asks of an engine besides the input bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRequest {
    pub languages: LanguageSelection,
    pub options: OcrOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    pub pdf: Vec<u8>,
    /// Extracted text, only when a sidecar was requested and produced.
    pub sidecar_text: Option<String>,
    pub detected_languages: Option<String>,
}

#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn kind(&self) -> EngineKind;

    async fn run(&self, input: &[u8], request: &EngineRequest) -> Result<EngineOutput, EngineError>;
}

/// One engine per [`EngineKind`], selected at dispatch time.
#[derive(Clone)]
pub struct EngineSet {
    ocrmypdf: Arc<dyn OcrEngine>,
    docling: Arc<dyn OcrEngine>,
}

impl EngineSet {
    pub fn new(ocrmypdf: Arc<dyn OcrEngine>, docling: Arc<dyn OcrEngine>) -> Self {
        Self { ocrmypdf, docling }
    }

    pub fn get(&self, kind: EngineKind) -> &Arc<dyn OcrEngine> {
        match kind {
            EngineKind::Ocrmypdf => &self.ocrmypdf,
            EngineKind::Docling => &self.docling,
        }
    }
}

/// Condenses process stderr into a one-paragraph message.
pub(crate) fn summarize_stderr(stderr: &[u8]) -> Option<String> {
    const MAX_CHARS: usize = 500;

    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return None;
    }

    // The last lines carry the actual error; earlier ones are progress noise.
    let tail = lines[lines.len().saturating_sub(3)..].join(" ");
    Some(tail.chars().take(MAX_CHARS).collect())
}
