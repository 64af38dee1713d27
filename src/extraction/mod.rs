//! Plain-text extraction from uploaded knowledge documents.
//!
//! The format is chosen from the stored object's file extension, never from a
//! client-declared content type. Anything unrecognised is decoded as UTF-8.

mod docx;

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentFormat {
    pub fn from_path(path: &str) -> Self {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("pdf") => DocumentFormat::Pdf,
            Some("docx") => DocumentFormat::Docx,
            _ => DocumentFormat::PlainText,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentFormat::PlainText => "text/plain; charset=utf-8",
        }
    }
}

/// The bytes could not be parsed as their hinted format. Distinct from a
/// document that parsed fine but holds no text, which is `Ok("")`.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("invalid PDF document: {0}")]
    Pdf(String),

    #[error("invalid DOCX document: {0}")]
    Docx(String),

    #[error("text extraction task failed: {0}")]
    Task(String),
}

/// Extracts linear text from `bytes`. CPU-bound parsing runs on the blocking
/// pool so slow documents do not stall the runtime.
pub async fn extract_text(bytes: Vec<u8>, format: DocumentFormat) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extract_text_sync(&bytes, format))
        .await
        .map_err(|e| ExtractionError::Task(e.to_string()))?
}

pub fn extract_text_sync(bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractionError> {
    let text = match format {
        DocumentFormat::Pdf => {
            log::debug!("Extracting text from PDF ({} bytes)", bytes.len());
            extract_pdf(bytes)?
        }
        DocumentFormat::Docx => {
            log::debug!("Extracting text from DOCX ({} bytes)", bytes.len());
            docx::extract_paragraphs(bytes)?
        }
        DocumentFormat::PlainText => String::from_utf8_lossy(bytes).into_owned(),
    };

    Ok(normalize(&text))
}

/// Readers accept the header anywhere in the first kilobyte.
const PDF_HEADER_WINDOW: usize = 1024;

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    let window = &bytes[..bytes.len().min(PDF_HEADER_WINDOW)];
    let start = window
        .windows(5)
        .position(|w| w == b"%PDF-")
        .ok_or_else(|| ExtractionError::Pdf("missing %PDF header".to_string()))?;
    // Cross-reference offsets count from the header.
    let bytes = &bytes[start..];

    // pdf-extract panics on some malformed inputs instead of returning an error.
    let result = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));

    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractionError::Pdf(e.to_string())),
        Err(_) => Err(ExtractionError::Pdf("parser aborted on malformed input".to_string())),
    }
}

/// Trims trailing whitespace from each line, collapses runs of blank lines
/// and strips a leading byte-order mark.
fn normalize(text: &str) -> String {
    let text = text.trim_start_matches('\u{feff}').replace("\r\n", "\n");

    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_is_chosen_by_extension() {
        assert_eq!(DocumentFormat::from_path("notes/biology.PDF"), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_path("a/b/c.docx"), DocumentFormat::Docx);
        assert_eq!(DocumentFormat::from_path("readme.txt"), DocumentFormat::PlainText);
        assert_eq!(DocumentFormat::from_path("no_extension"), DocumentFormat::PlainText);
        assert_eq!(DocumentFormat::from_path("legacy.doc"), DocumentFormat::PlainText);
    }

    #[test]
    fn plain_text_is_decoded_and_normalized() {
        let bytes = "\u{feff}First paragraph.  \r\n\r\n\r\n\r\nSecond paragraph.\n".as_bytes();

        let text = extract_text_sync(bytes, DocumentFormat::PlainText).expect("text should decode");

        assert_eq!(text, "First paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn invalid_utf8_plain_text_is_decoded_lossily() {
        let text = extract_text_sync(&[0x66, 0x6f, 0xff, 0x6f], DocumentFormat::PlainText)
            .expect("plain text never fails");

        assert!(text.starts_with("fo"));
    }

    #[test]
    fn empty_plain_text_is_valid_output() {
        let text = extract_text_sync(b"   \n\n", DocumentFormat::PlainText).expect("should succeed");
        assert!(text.is_empty());
    }

    #[test]
    fn corrupt_pdf_is_an_extraction_error() {
        let result = extract_text_sync(b"this is not really a pdf", DocumentFormat::Pdf);
        assert!(matches!(result, Err(ExtractionError::Pdf(_))));
    }

    /// A one-page PDF showing `text` in Helvetica, with a correct xref table.
    fn single_page_pdf(text: &str) -> Vec<u8> {
        let content = format!("BT /F1 24 Tf 72 700 Td ({text}) Tj ET");
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
                .to_string(),
            format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref_start = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
        for offset in offsets {
            pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref_start
            )
            .as_bytes(),
        );
        pdf
    }

    #[test]
    fn pdf_page_text_is_extracted() {
        let text = extract_text_sync(&single_page_pdf("Mitochondria make ATP"), DocumentFormat::Pdf)
            .expect("valid pdf");

        assert!(text.contains("Mitochondria make ATP"), "got {text:?}");
    }

    #[test]
    fn pdf_header_after_leading_bytes_is_accepted() {
        let mut bytes = b"\n\n".to_vec();
        bytes.extend(single_page_pdf("Ribosomes build proteins"));

        let text = extract_text_sync(&bytes, DocumentFormat::Pdf).expect("header within first kilobyte");

        assert!(text.contains("Ribosomes build proteins"), "got {text:?}");
    }

    #[test]
    fn pdf_header_beyond_first_kilobyte_is_rejected() {
        let mut bytes = vec![b' '; 2048];
        bytes.extend(single_page_pdf("Too late"));

        let result = extract_text_sync(&bytes, DocumentFormat::Pdf);

        assert!(matches!(result, Err(ExtractionError::Pdf(message)) if message.contains("header")));
    }

    #[test]
    fn corrupt_docx_is_an_extraction_error() {
        let result = extract_text_sync(b"PK\x03\x04 definitely not a zip", DocumentFormat::Docx);
        assert!(matches!(result, Err(ExtractionError::Docx(_))));
    }

    #[tokio::test]
    async fn async_extraction_runs_on_blocking_pool() {
        let text = extract_text(b"hello".to_vec(), DocumentFormat::PlainText)
            .await
            .expect("should extract");
        assert_eq!(text, "hello");
    }
}
