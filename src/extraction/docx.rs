use std::io::{Cursor, Read};

use quick_xml::{events::Event, Reader};
use zip::ZipArchive;

use super::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";
const MAX_DOCUMENT_PART_BYTES: u64 = 64 * 1024 * 1024;

/// Reads the main document part of an Office Open XML word-processing file
/// and returns its paragraph text, one paragraph per line. Headers, footers,
/// footnotes and formatting are dropped.
pub(super) fn extract_paragraphs(bytes: &[u8]) -> Result<String, ExtractionError> {
    extract_paragraphs_within(bytes, MAX_DOCUMENT_PART_BYTES)
}

fn extract_paragraphs_within(bytes: &[u8], limit: u64) -> Result<String, ExtractionError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractionError::Docx(e.to_string()))?;

    let part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractionError::Docx(format!("{DOCUMENT_PART}: {e}")))?;

    if part.size() > limit {
        return Err(ExtractionError::Docx(format!(
            "{DOCUMENT_PART} is too large ({} bytes)",
            part.size()
        )));
    }

    // The declared size comes from the archive and may be forged.
    let xml = read_bounded(part, limit)?;
    paragraphs_from_xml(&xml)
}

fn read_bounded(part: impl Read, limit: u64) -> Result<String, ExtractionError> {
    let mut buf = Vec::new();
    part.take(limit + 1)
        .read_to_end(&mut buf)
        .map_err(|e| ExtractionError::Docx(e.to_string()))?;

    if buf.len() as u64 > limit {
        return Err(ExtractionError::Docx(format!(
            "{DOCUMENT_PART} inflates past {limit} bytes"
        )));
    }

    String::from_utf8(buf).map_err(|e| ExtractionError::Docx(format!("{DOCUMENT_PART}: {e}")))
}

fn paragraphs_from_xml(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = true;
                }
            }
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text_run => {
                let text = t
                    .unescape()
                    .map_err(|e| ExtractionError::Docx(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::Docx(format!(
                    "malformed XML at position {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(out)
}
