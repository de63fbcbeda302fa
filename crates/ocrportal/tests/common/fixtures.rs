#![allow(dead_code)]

use lopdf::{dictionary, Document, Object, Stream};

/// Marker that makes the fake ocrmypdf report an existing text layer.
pub const TEXT_LAYER_MARKER: &str = "HAS_TEXT_LAYER";
/// Marker that makes the fake engines sleep past any test timeout.
pub const SLOW_MARKER: &str = "SLOW_INPUT";
/// Marker that makes the fake ocrmypdf reject the input as unreadable.
pub const CORRUPT_MARKER: &str = "CORRUPT_INPUT";

/// Text written to the sidecar by the fake ocrmypdf.
pub const SIDECAR_TEXT: &str = "Invoice INV-2026-001\nTotal due: 120.00 EUR\n";

/// Emulates `ocrmypdf [flags...] <input> <output>`.
pub const FAKE_OCRMYPDF: &str = r#"
force=0
skip=0
sidecar=""
while [ $# -gt 2 ]; do
    case "$1" in
        --force-ocr) force=1 ;;
        --skip-text) skip=1 ;;
        --sidecar) shift; sidecar="$1" ;;
        --language|--optimize|--output-type) shift ;;
    esac
    shift
done
input="$1"
output="$2"

if grep -q SLOW_INPUT "$input"; then
    exec sleep 30
fi
if grep -q CORRUPT_INPUT "$input"; then
    echo "InputFileError: not a PDF" >&2
    exit 2
fi
if grep -q HAS_TEXT_LAYER "$input" && [ $force -eq 0 ] && [ $skip -eq 0 ]; then
    echo "PriorOcrFoundError: page already has text! - aborting (use --force-ocr to force OCR)" >&2
    exit 6
fi

cp "$input" "$output"
if [ -n "$sidecar" ]; then
    printf 'Invoice INV-2026-001\nTotal due: 120.00 EUR\n' > "$sidecar"
fi
"#;

/// Emulates `docling --to md --to text --output <dir> <input>` and
/// `docling --version`.
pub const FAKE_DOCLING: &str = r#"
if [ "$1" = "--version" ]; then
    echo "Docling version: 2.15.0"
    exit 0
fi
out=""
while [ $# -gt 1 ]; do
    case "$1" in
        --output) shift; out="$1" ;;
    esac
    shift
done
input="$1"

if grep -q CORRUPT_INPUT "$input"; then
    echo "ConversionError: invalid document" >&2
    exit 1
fi

printf '# Quarterly Report\n\nRevenue grew by **12%%** this quarter.\n\n- North region\n' > "$out/input.md"
"#;

/// A one-page PDF whose content stream shows `text`.
pub fn sample_pdf(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
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

    let mut pdf_bytes = Vec::new();
    doc.save_to(&mut pdf_bytes).unwrap();
    pdf_bytes
}

/// A scanned page without a text layer.
pub fn scanned_pdf() -> Vec<u8> {
    sample_pdf("scanned page")
}
