use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

use super::markdown::markdown_to_plain_text;
use super::{
    summarize_stderr, CapabilityRegistry, EngineError, EngineOutput, EngineRequest, OcrEngine,
    ScratchArea,
};
use crate::job::EngineKind;

const NOT_INSTALLED: &str = "Docling is not installed. Install the docling package to use this engine.";

/// Sidecar text used when the conversion yields nothing readable.
pub const NO_TEXT_PLACEHOLDER: &str = "No text could be extracted from the document.";

/// A document produced by the conversion backend.
///
/// Exports are optional capabilities: a backend implements the ones it has and
/// leaves the rest at their `None` defaults. Callers go through
/// [`resolve_pdf`] and [`resolve_text`], which apply a fixed preference order.
pub trait ConvertedDocument {
    fn export_pdf(&self) -> Option<Vec<u8>> {
        None
    }

    fn export_markdown(&self) -> Option<String> {
        None
    }

    fn export_text(&self) -> Option<String> {
        None
    }

    fn page_texts(&self) -> Option<Vec<String>> {
        None
    }
}

/// Native PDF export, else the original bytes unchanged.
pub fn resolve_pdf(document: &dyn ConvertedDocument, original: &[u8]) -> Vec<u8> {
    match document.export_pdf() {
        Some(pdf) if !pdf.is_empty() => pdf,
        _ => original.to_vec(),
    }
}

/// Normalized markdown, else plain text, else joined page text, else the
/// placeholder. The first export the document offers wins.
pub fn resolve_text(document: &dyn ConvertedDocument) -> String {
    let text = if let Some(markdown) = document.export_markdown() {
        markdown_to_plain_text(&markdown)
    } else if let Some(text) = document.export_text() {
        text
    } else if let Some(pages) = document.page_texts() {
        pages
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        String::new()
    };

    let text = text.trim();
    if text.is_empty() {
        NO_TEXT_PLACEHOLDER.to_string()
    } else {
        text.to_string()
    }
}

/// What `docling --to md --to text --output <dir>` leaves behind, plus the
/// input PDF for raw page text.
struct DoclingOutputDir<'a> {
    markdown_path: PathBuf,
    text_path: PathBuf,
    input: &'a [u8],
}

impl<'a> DoclingOutputDir<'a> {
    fn new(dir: &Path, input_stem: &str, input: &'a [u8]) -> Self {
        Self {
            markdown_path: dir.join(format!("{}.md", input_stem)),
            text_path: dir.join(format!("{}.txt", input_stem)),
            input,
        }
    }

    fn has_any_export(&self) -> bool {
        self.markdown_path.is_file() || self.text_path.is_file()
    }
}

fn read_text(path: &Path) -> Option<String> {
    std::fs::read(path)
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

impl ConvertedDocument for DoclingOutputDir<'_> {
    fn export_markdown(&self) -> Option<String> {
        read_text(&self.markdown_path)
    }

    fn export_text(&self) -> Option<String> {
        read_text(&self.text_path)
    }

    fn page_texts(&self) -> Option<Vec<String>> {
        let document = lopdf::Document::load_mem(self.input).ok()?;
        let pages = document
            .get_pages()
            .into_keys()
            .filter_map(|page_num| document.extract_text(&[page_num]).ok())
            .collect();
        Some(pages)
    }
}

/// Structured conversion through the `docling` command line.
pub struct DoclingEngine {
    program: String,
    extra_args: Vec<String>,
    scratch_dir: Option<PathBuf>,
    capabilities: Arc<CapabilityRegistry>,
}

impl DoclingEngine {
    pub fn new(
        program: impl Into<String>,
        extra_args: Vec<String>,
        capabilities: Arc<CapabilityRegistry>,
    ) -> Self {
        Self {
            program: program.into(),
            extra_args,
            scratch_dir: None,
            capabilities,
        }
    }

    pub fn with_scratch_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.scratch_dir = dir;
        self
    }
}

#[async_trait]
impl OcrEngine for DoclingEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Docling
    }

    async fn run(&self, input: &[u8], request: &EngineRequest) -> Result<EngineOutput, EngineError> {
        if !self.capabilities.conversion_available().await {
            return Err(EngineError::Unavailable(NOT_INSTALLED.to_string()));
        }

        let scratch = ScratchArea::new(self.scratch_dir.as_deref())?;
        let input_path = scratch.write_input(input).await?;
        let export_dir = scratch.path().join("export");
        tokio::fs::create_dir_all(&export_dir)
            .await
            .map_err(|e| EngineError::Processing(format!("Cannot prepare export directory: {}", e)))?;

        let output = Command::new(&self.program)
            .args(&self.extra_args)
            .args(["--to", "md", "--to", "text", "--output"])
            .arg(&export_dir)
            .arg(&input_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::Unavailable(NOT_INSTALLED.to_string())
                } else {
                    EngineError::Processing(format!("Failed to run docling: {}", e))
                }
            })?;

        if !output.status.success() {
            let message = match summarize_stderr(&output.stderr) {
                Some(detail) => format!("Docling could not process the document: {}", detail),
                None => "Docling could not process the document.".to_string(),
            };
            tracing::warn!(code = ?output.status.code(), "docling failed");
            return Err(EngineError::Processing(message));
        }

        let document = DoclingOutputDir::new(&export_dir, "input", input);
        if !document.has_any_export() {
            tracing::debug!("docling wrote no text export, falling back to page text");
        }

        let pdf = resolve_pdf(&document, input);
        if pdf.is_empty() {
            return Err(EngineError::Output(
                "Docling finished without producing a PDF".to_string(),
            ));
        }
        let sidecar_text = request
            .options
            .make_sidecar
            .then(|| resolve_text(&document));

        Ok(EngineOutput {
            pdf,
            sidecar_text,
            detected_languages: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ProbeOutcome, StaticProbe};

    #[derive(Default)]
    struct Exports {
        pdf: Option<Vec<u8>>,
        markdown: Option<String>,
        text: Option<String>,
        pages: Option<Vec<String>>,
    }

    impl ConvertedDocument for Exports {
        fn export_pdf(&self) -> Option<Vec<u8>> {
            self.pdf.clone()
        }
        fn export_markdown(&self) -> Option<String> {
            self.markdown.clone()
        }
        fn export_text(&self) -> Option<String> {
            self.text.clone()
        }
        fn page_texts(&self) -> Option<Vec<String>> {
            self.pages.clone()
        }
    }

    struct Nothing;
    impl ConvertedDocument for Nothing {}

    fn text_pdf(text: &str) -> Vec<u8> {
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = format!("BT /F1 12 Tf 50 700 Td ({}) Tj ET", text);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    /// A docling stand-in that exits cleanly without writing any export.
    fn silent_docling() -> DoclingEngine {
        let capabilities = Arc::new(CapabilityRegistry::new(Arc::new(StaticProbe(ProbeOutcome::Available))));
        DoclingEngine::new("sh", vec!["-c".to_string(), "exit 0".to_string()], capabilities)
    }

    fn sidecar_request() -> EngineRequest {
        EngineRequest {
            languages: crate::job::LanguageSelection::Auto,
            options: crate::job::OcrOptions {
                make_sidecar: true,
                ..Default::default()
            },
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_no_export_falls_back_to_page_text() {
        let input = text_pdf("Quarterly figures");

        let output = silent_docling().run(&input, &sidecar_request()).await.unwrap();

        assert_eq!(output.pdf, input);
        let text = output.sidecar_text.unwrap();
        assert!(text.contains("Quarterly figures"), "got {:?}", text);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_no_export_and_unreadable_pdf_gives_placeholder() {
        let output = silent_docling()
            .run(b"%PDF-1.4 not really", &sidecar_request())
            .await
            .unwrap();

        assert_eq!(output.sidecar_text.as_deref(), Some(NO_TEXT_PLACEHOLDER));
    }

    #[test]
    fn test_pdf_falls_back_to_original() {
        assert_eq!(resolve_pdf(&Nothing, b"orig"), b"orig");
        let native = Exports {
            pdf: Some(b"native".to_vec()),
            ..Default::default()
        };
        assert_eq!(resolve_pdf(&native, b"orig"), b"native");
    }

    #[test]
    fn test_markdown_preferred_over_text() {
        let doc = Exports {
            markdown: Some("## Title\n- point".to_string()),
            text: Some("ignored".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_text(&doc), "Title\npoint");
    }

    #[test]
    fn test_text_then_pages() {
        let text_only = Exports {
            text: Some("  plain  ".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_text(&text_only), "plain");

        let pages_only = Exports {
            pages: Some(vec!["page one".to_string(), " ".to_string(), "page two".to_string()]),
            ..Default::default()
        };
        assert_eq!(resolve_text(&pages_only), "page one\npage two");
    }

    #[test]
    fn test_placeholder_when_nothing_extracted() {
        assert_eq!(resolve_text(&Nothing), NO_TEXT_PLACEHOLDER);
        let blank = Exports {
            markdown: Some("\n  \n".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_text(&blank), NO_TEXT_PLACEHOLDER);
    }
}
