//! PDF text extraction for uploaded documents.
//!
//! Uploads supply bytes plus a content type; this module returns plain UTF-8
//! text. Extraction errors surface as rejected uploads — the pipeline never
//! panics on malformed input.

/// Content type of a PDF upload.
pub const MIME_PDF: &str = "application/pdf";
/// Some browsers send PDF parts with a generic content type; we accept it
/// and rely on the `%PDF-` magic check instead.
pub const MIME_OCTET_STREAM: &str = "application/octet-stream";

/// Extraction error; the upload pipeline rejects the whole upload on any of these.
#[derive(Debug)]
pub enum ExtractError {
    UnsupportedContentType(String),
    NotPdf,
    Pdf(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::UnsupportedContentType(ct) => {
                write!(f, "unsupported content-type: {}", ct)
            }
            ExtractError::NotPdf => write!(f, "file is not a PDF"),
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Whether an uploaded part's content type is acceptable for extraction.
pub fn accepts(content_type: &str) -> bool {
    matches!(content_type, MIME_PDF | MIME_OCTET_STREAM)
}

/// Extracts plain text from PDF bytes.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    if !bytes.starts_with(b"%PDF-") {
        return Err(ExtractError::NotPdf);
    }
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_pdf_and_octet_stream_only() {
        assert!(accepts(MIME_PDF));
        assert!(accepts(MIME_OCTET_STREAM));
        assert!(!accepts("text/plain"));
        assert!(!accepts("image/png"));
    }

    #[test]
    fn non_pdf_bytes_return_error() {
        let err = extract_text(b"hello, not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::NotPdf));
    }

    #[test]
    fn extracts_text_from_generated_pdf() {
        let bytes = crate::test_pdf::pdf_with_text("Hello retrieval world");
        let text = extract_text(&bytes).unwrap();
        assert!(text.contains("Hello"), "extracted: {:?}", text);
    }
}
