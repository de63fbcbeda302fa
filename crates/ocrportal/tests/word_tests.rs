//! Word documents built from typed text and from OCR output.

mod common;

use std::io::Read;

use common::*;
use ocrportal::{ArtifactStore, EngineKind, PortalError, Upload, WordError};

const USER: &str = "user-1";

fn docx_part(bytes: Vec<u8>, name: &str) -> String {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut content = String::new();
    archive.by_name(name).unwrap().read_to_string(&mut content).unwrap();
    content
}

#[test]
fn test_created_document_is_valid_package() {
    let harness = TestHarness::new();
    let studio = harness.word_studio();

    let document = studio
        .create(USER, "Meeting notes", "Agenda <draft>\nAction items & owners")
        .unwrap();
    let bytes = harness.storage.open(&document.docx_file).unwrap();

    let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.clone())).unwrap();
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort();
    assert_eq!(names, vec!["[Content_Types].xml", "_rels/.rels", "word/document.xml"]);

    let xml = docx_part(bytes, "word/document.xml");
    assert!(xml.contains("Meeting notes"));
    assert!(xml.contains("Agenda &lt;draft&gt;"));
    assert!(xml.contains("Action items &amp; owners"));

    let on_disk = harness.files_under("word/documents");
    assert_eq!(on_disk.len(), 1);
    assert!(on_disk[0].ends_with("Meeting_notes.docx"));
}

#[tokio::test]
async fn test_convert_pdf_builds_document_from_sidecar() {
    let harness = TestHarness::new();
    let studio = harness.word_studio();

    let document = studio
        .convert_pdf(USER, "Invoice", Upload::from_filename("invoice.pdf", scanned_pdf()))
        .await
        .unwrap();

    let xml = docx_part(harness.storage.open(&document.docx_file).unwrap(), "word/document.xml");
    for line in SIDECAR_TEXT.lines() {
        assert!(xml.contains(line), "missing {:?}", line);
    }
    assert!(document.source_file.is_some());
    assert_eq!(harness.files_under("word/source").len(), 1);
    assert_eq!(studio.documents(USER).unwrap().len(), 1);
}

#[tokio::test]
async fn test_convert_pdf_with_conversion_engine() {
    let harness = TestHarness::new();
    harness.select_engine(EngineKind::Docling).await;

    let document = harness
        .word_studio()
        .convert_pdf(USER, "Report", Upload::from_filename("report.pdf", scanned_pdf()))
        .await
        .unwrap();

    let xml = docx_part(harness.storage.open(&document.docx_file).unwrap(), "word/document.xml");
    assert!(xml.contains("Quarterly Report"));
    assert!(xml.contains("North region"));
}

#[tokio::test]
async fn test_convert_pdf_surfaces_job_failure() {
    let harness = TestHarness::new();
    let studio = harness.word_studio();

    let result = studio
        .convert_pdf(
            USER,
            "Digital",
            Upload::from_filename("digital.pdf", sample_pdf(TEXT_LAYER_MARKER)),
        )
        .await;

    match result {
        Err(PortalError::Word(WordError::ConversionFailed(message))) => {
            assert!(message.contains("page already has text"), "got: {}", message);
        }
        other => panic!("Expected ConversionFailed, got {:?}", other),
    }
    assert!(studio.documents(USER).unwrap().is_empty());
    assert!(harness.files_under("word").is_empty());
}
