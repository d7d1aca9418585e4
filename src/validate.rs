//! Structural format classification for candidate documents.
//!
//! A candidate file is probed against the supported formats in
//! [`DocumentFormat::ALL`] order; the first structural match wins. Probes
//! are pure functions of the file bytes: they never mutate the file and a
//! malformed input is a negative match, never a fault.
//!
//! Note the classification order puts TEXT before HTML and CSV, so any
//! non-empty UTF-8 file classifies as TEXT even when it would also parse
//! as markup or delimited text. This matches the catalog's historical
//! behavior and keeps ids stable across re-registration.

use std::io::Read;
use std::path::Path;

use crate::models::DocumentFormat;

/// OLE2 compound-file header, the container of legacy `.xls` workbooks.
const OLE2_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Cap on bytes read from a single ZIP entry during probing (zip-bomb
/// protection; the probe only needs to know the entry opens).
const MAX_PROBE_ENTRY_BYTES: u64 = 4 * 1024;

/// Classify a file into a supported format, or `None` if no probe matches.
///
/// Unreadable files classify as `None`; the registry surfaces that as an
/// invalid-format rejection.
pub fn classify(path: &Path) -> Option<DocumentFormat> {
    let bytes = std::fs::read(path).ok()?;
    classify_bytes(&bytes)
}

/// Probe raw bytes against every supported format in order.
pub fn classify_bytes(bytes: &[u8]) -> Option<DocumentFormat> {
    DocumentFormat::ALL
        .into_iter()
        .find(|format| probe(*format, bytes))
}

fn probe(format: DocumentFormat, bytes: &[u8]) -> bool {
    match format {
        DocumentFormat::Docx => is_docx(bytes),
        DocumentFormat::Pdf => is_pdf(bytes),
        DocumentFormat::Text => is_text(bytes),
        DocumentFormat::Html => is_html(bytes),
        DocumentFormat::Xls => is_xls(bytes),
        DocumentFormat::Xlsx => is_xlsx(bytes),
        DocumentFormat::Csv => is_csv(bytes),
    }
}

/// A DOCX is a ZIP archive carrying `word/document.xml`.
fn is_docx(bytes: &[u8]) -> bool {
    zip_has_entry(bytes, "word/document.xml")
}

/// A PDF must parse and report at least one page.
fn is_pdf(bytes: &[u8]) -> bool {
    match lopdf::Document::load_mem(bytes) {
        Ok(doc) => !doc.get_pages().is_empty(),
        Err(_) => false,
    }
}

/// Plain text: non-empty valid UTF-8.
fn is_text(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(text) => !text.is_empty(),
        Err(_) => false,
    }
}

/// Markup: parsing yields an `html` root element.
fn is_html(bytes: &[u8]) -> bool {
    if std::str::from_utf8(bytes).is_err() {
        return false;
    }
    let mut reader = quick_xml::Reader::from_reader(bytes);
    reader.config_mut().check_end_names = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref().eq_ignore_ascii_case(b"html") {
                    return true;
                }
            }
            Ok(quick_xml::events::Event::Eof) => return false,
            Err(_) => return false,
            _ => {}
        }
        buf.clear();
    }
}

/// Legacy spreadsheet: OLE2 compound-file magic.
fn is_xls(bytes: &[u8]) -> bool {
    bytes.starts_with(&OLE2_MAGIC)
}

/// An XLSX is a ZIP archive carrying `xl/workbook.xml`.
fn is_xlsx(bytes: &[u8]) -> bool {
    zip_has_entry(bytes, "xl/workbook.xml")
}

/// Delimited text: UTF-8 with a non-empty first record.
fn is_csv(bytes: &[u8]) -> bool {
    let text = match std::str::from_utf8(bytes) {
        Ok(t) => t,
        Err(_) => return false,
    };
    text.lines()
        .next()
        .map(|line| !line.trim().is_empty())
        .unwrap_or(false)
}

/// True if `bytes` open as a ZIP archive containing `name` and the entry
/// itself starts to decompress.
fn zip_has_entry(bytes: &[u8], name: &str) -> bool {
    let mut archive = match zip::ZipArchive::new(std::io::Cursor::new(bytes)) {
        Ok(a) => a,
        Err(_) => return false,
    };
    let entry = match archive.by_name(name) {
        Ok(e) => e,
        Err(_) => return false,
    };
    let mut probe_buf = Vec::new();
    let read = entry
        .take(MAX_PROBE_ENTRY_BYTES)
        .read_to_end(&mut probe_buf);
    read.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn zip_with_entry(name: &str, content: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            writer
                .start_file(name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content).unwrap();
            writer.finish().unwrap();
        }
        buf
    }

    /// Minimal single-page PDF, built with correct xref byte offsets so a
    /// strict parser accepts it.
    fn minimal_pdf() -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n");
        let o1 = out.len();
        out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
        let o2 = out.len();
        out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
        let o3 = out.len();
        out.extend_from_slice(
            b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >> endobj\n",
        );
        let xref_start = out.len();
        out.extend_from_slice(b"xref\n0 4\n");
        out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
        out.extend_from_slice(format!("{:010} 00000 n \n", o1).as_bytes());
        out.extend_from_slice(format!("{:010} 00000 n \n", o2).as_bytes());
        out.extend_from_slice(format!("{:010} 00000 n \n", o3).as_bytes());
        out.extend_from_slice(b"trailer << /Size 4 /Root 1 0 R >>\nstartxref\n");
        out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
        out.extend_from_slice(b"%%EOF\n");
        out
    }

    #[test]
    fn test_docx_classifies() {
        let bytes = zip_with_entry(
            "word/document.xml",
            b"<w:document><w:body><w:p><w:r><w:t>hello</w:t></w:r></w:p></w:body></w:document>",
        );
        assert_eq!(classify_bytes(&bytes), Some(DocumentFormat::Docx));
    }

    #[test]
    fn test_xlsx_classifies() {
        let bytes = zip_with_entry("xl/workbook.xml", b"<workbook/>");
        assert_eq!(classify_bytes(&bytes), Some(DocumentFormat::Xlsx));
    }

    #[test]
    fn test_zip_without_known_entry_rejected() {
        let bytes = zip_with_entry("other/file.xml", b"<x/>");
        assert_eq!(classify_bytes(&bytes), None);
    }

    #[test]
    fn test_pdf_classifies() {
        assert_eq!(classify_bytes(&minimal_pdf()), Some(DocumentFormat::Pdf));
    }

    #[test]
    fn test_truncated_pdf_falls_through_to_text() {
        // The PDF probe is a negative match, not a fault; valid UTF-8
        // bytes then land on the TEXT probe.
        assert_eq!(
            classify_bytes(b"%PDF-1.4 garbage"),
            Some(DocumentFormat::Text)
        );
    }

    #[test]
    fn test_plain_text_wins_before_markup_and_csv() {
        assert_eq!(
            classify_bytes(b"<html><body>hi</body></html>"),
            Some(DocumentFormat::Text)
        );
        assert_eq!(classify_bytes(b"a,b,c\n1,2,3\n"), Some(DocumentFormat::Text));
    }

    #[test]
    fn test_legacy_spreadsheet_magic() {
        let mut bytes = OLE2_MAGIC.to_vec();
        bytes.extend_from_slice(&[0u8; 64]);
        assert_eq!(classify_bytes(&bytes), Some(DocumentFormat::Xls));
    }

    #[test]
    fn test_empty_and_binary_garbage_rejected() {
        assert_eq!(classify_bytes(b""), None);
        assert_eq!(classify_bytes(&[0xFFu8, 0xFE, 0x00, 0x01]), None);
    }

    #[test]
    fn test_unreadable_path_rejected() {
        assert_eq!(classify(Path::new("/nonexistent/nope.pdf")), None);
    }
}
