//! Minimal WordprocessingML writer.

use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::WordError;

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Builds a `.docx` package: a bold heading followed by one paragraph per
/// entry of `paragraphs`.
pub fn build<S: AsRef<str>>(title: &str, paragraphs: &[S]) -> Result<Vec<u8>, WordError> {
    let document_xml = document_xml(title, paragraphs)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", PACKAGE_RELS.as_bytes()),
        ("word/document.xml", document_xml.as_slice()),
    ] {
        zip.start_file(name, options)
            .map_err(|e| WordError::Build(format!("Failed to add {}: {}", name, e)))?;
        zip.write_all(content)
            .map_err(|e| WordError::Build(format!("Failed to write {}: {}", name, e)))?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| WordError::Build(format!("Failed to finish package: {}", e)))?;
    Ok(cursor.into_inner())
}

fn document_xml<S: AsRef<str>>(title: &str, paragraphs: &[S]) -> Result<Vec<u8>, WordError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    emit(
        &mut writer,
        Event::Start(BytesStart::new("w:document").with_attributes([("xmlns:w", WORDML_NS)])),
    )?;
    emit(&mut writer, Event::Start(BytesStart::new("w:body")))?;

    write_paragraph(&mut writer, title, true)?;
    for paragraph in paragraphs {
        write_paragraph(&mut writer, paragraph.as_ref(), false)?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("w:body")))?;
    emit(&mut writer, Event::End(BytesEnd::new("w:document")))?;

    Ok(writer.into_inner().into_inner())
}

fn write_paragraph<W: Write>(writer: &mut Writer<W>, text: &str, heading: bool) -> Result<(), WordError> {
    emit(writer, Event::Start(BytesStart::new("w:p")))?;
    emit(writer, Event::Start(BytesStart::new("w:r")))?;

    if heading {
        emit(writer, Event::Start(BytesStart::new("w:rPr")))?;
        emit(writer, Event::Empty(BytesStart::new("w:b")))?;
        emit(
            writer,
            Event::Empty(BytesStart::new("w:sz").with_attributes([("w:val", "32")])),
        )?;
        emit(writer, Event::End(BytesEnd::new("w:rPr")))?;
    }

    emit(
        writer,
        Event::Start(BytesStart::new("w:t").with_attributes([("xml:space", "preserve")])),
    )?;
    let text = xml_text(text);
    emit(writer, Event::Text(BytesText::new(&text)))?;
    emit(writer, Event::End(BytesEnd::new("w:t")))?;

    emit(writer, Event::End(BytesEnd::new("w:r")))?;
    emit(writer, Event::End(BytesEnd::new("w:p")))
}

/// Drops characters XML 1.0 cannot carry, such as the form feeds OCR puts
/// between pages. Markup characters are escaped later by the writer.
fn xml_text(text: &str) -> String {
    text.chars().filter(|&c| is_xml_char(c)).collect()
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), WordError> {
    writer
        .write_event(event)
        .map_err(|e| WordError::Build(format!("Failed to write document.xml: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::Reader;
    use std::io::Read;

    fn read_part(docx: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut content = String::new();
        part.read_to_string(&mut content).unwrap();
        content
    }

    /// Paragraph texts in document order.
    fn paragraphs(xml: &str) -> Vec<String> {
        let mut reader = Reader::from_str(xml);
        let mut result = Vec::new();
        let mut current = String::new();
        let mut in_text = false;
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
                Event::End(e) if e.local_name().as_ref() == b"t" => in_text = false,
                Event::End(e) if e.local_name().as_ref() == b"p" => {
                    result.push(std::mem::take(&mut current));
                }
                Event::Text(e) if in_text => current.push_str(&e.unescape().unwrap()),
                Event::Eof => break,
                _ => {}
            }
        }
        result
    }

    #[test]
    fn test_package_has_required_parts() {
        let docx = build("Title", &["body"]).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(docx.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();

        for part in ["[Content_Types].xml", "_rels/.rels", "word/document.xml"] {
            assert!(names.contains(&part), "missing {}", part);
        }
        assert!(read_part(&docx, "[Content_Types].xml").contains("/word/document.xml"));
    }

    #[test]
    fn test_heading_then_paragraphs() {
        let docx = build("Meeting notes", &["First line", "Second line"]).unwrap();
        let xml = read_part(&docx, "word/document.xml");

        assert_eq!(
            paragraphs(&xml),
            ["Meeting notes", "First line", "Second line"]
        );
        assert!(xml.contains("<w:b/>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let docx = build("R&D <draft>", &["a < b"]).unwrap();
        let xml = read_part(&docx, "word/document.xml");

        assert!(xml.contains("R&amp;D &lt;draft&gt;"));
        assert!(xml.contains("a &lt; b"));
        assert!(!xml.contains("<draft>"));
    }

    #[test]
    fn test_control_characters_are_dropped() {
        let docx = build("T\u{1}", &["page one\u{c}page two", "tab\there"]).unwrap();
        let xml = read_part(&docx, "word/document.xml");

        assert!(!xml.contains('\u{c}'));
        assert!(!xml.contains('\u{1}'));
        assert_eq!(paragraphs(&xml), ["T", "page onepage two", "tab\there"]);
    }

    #[test]
    fn test_empty_body() {
        let docx = build::<&str>("Only a title", &[]).unwrap();
        let xml = read_part(&docx, "word/document.xml");
        assert_eq!(paragraphs(&xml), ["Only a title"]);
    }
}
