//! PDF text extraction for downloaded documents.

use lopdf::Document;
use pdf_extract::PlainTextOutput;
use tracing::debug;

use crate::error::{DocumentKind, FetchError};

/// Magic bytes every PDF file starts with (possibly after a little junk).
const PDF_MAGIC: &[u8] = b"%PDF-";

/// How far into the body the PDF header may appear.
const MAGIC_SEARCH_WINDOW: usize = 1024;

/// Whether `bytes` carries a PDF header near the start.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(MAGIC_SEARCH_WINDOW)];
    window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

/// Extract the text of the first `max_pages` pages, in page order.
///
/// Returns one string per page. An empty vector means the document parsed
/// but has no pages. Pages past `max_pages` are never decoded. This is
/// CPU-bound; call it from a blocking thread.
pub(crate) fn leading_pages(bytes: &[u8], max_pages: usize) -> Result<Vec<String>, FetchError> {
    if !looks_like_pdf(bytes) {
        return Err(FetchError::document(
            DocumentKind::Corrupt,
            "response is not a PDF document",
        ));
    }

    let mut doc =
        Document::load_mem(bytes).map_err(|e| FetchError::from_pdf_message(e.to_string()))?;

    // Documents readable with the empty user password are decrypted on load.
    if doc.is_encrypted() {
        doc.decrypt("").map_err(|e| {
            FetchError::document(DocumentKind::Encrypted, format!("cannot decrypt document: {e}"))
        })?;
    }

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().take(max_pages).collect();
    let mut pages = Vec::with_capacity(page_numbers.len());

    for page_num in page_numbers {
        match page_text(&doc, page_num) {
            Ok(text) => pages.push(text),
            Err(e) if pages.is_empty() => return Err(e),
            Err(e) => {
                // Keep what was read so far, like a reader stopping at a bad page.
                debug!(page_num, error = %e, "page unreadable, stopping");
                break;
            }
        }
    }

    Ok(pages)
}

fn page_text(doc: &Document, page_num: u32) -> Result<String, FetchError> {
    let mut text = String::new();
    {
        let mut output = PlainTextOutput::new(&mut text);
        pdf_extract::output_doc_page(doc, &mut output, page_num)
            .map_err(|e| FetchError::from_pdf_message(e.to_string()))?;
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{encrypted_pdf_with_pages, pdf_with_pages, pdf_with_unreadable_tail};

    #[test]
    fn detects_pdf_header() {
        assert!(looks_like_pdf(b"%PDF-1.7\n..."));
        assert!(looks_like_pdf(b"\xef\xbb\xbf%PDF-1.4"));
        assert!(!looks_like_pdf(b"<!doctype html><html></html>"));
        assert!(!looks_like_pdf(b""));
    }

    #[test]
    fn html_is_rejected_before_parsing() {
        let err = leading_pages(b"<html><body>Not found</body></html>", 5).unwrap_err();
        assert!(matches!(
            err,
            FetchError::Document {
                kind: DocumentKind::Corrupt,
                ..
            }
        ));
    }

    #[test]
    fn pdf_header_with_garbage_is_an_error() {
        assert!(leading_pages(b"%PDF-1.4\nthis is not really a pdf", 5).is_err());
    }

    #[test]
    fn takes_only_requested_pages() {
        let bytes = pdf_with_pages(&["Alpha", "Bravo", "Charlie"]);
        let pages = leading_pages(&bytes, 2).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("Alpha"));
        assert!(pages[1].contains("Bravo"));
    }

    #[test]
    fn zero_page_document_yields_no_pages() {
        let pages = leading_pages(&pdf_with_pages(&[]), 5).unwrap();
        assert!(pages.is_empty());
    }

    #[test]
    fn pages_past_the_limit_are_not_decoded() {
        // Every page after the fifth would panic the text extractor.
        let bytes = pdf_with_unreadable_tail(&["p1", "p2", "p3", "p4", "p5"], 300);
        let pages = leading_pages(&bytes, 5).unwrap();
        assert_eq!(pages.len(), 5);
        assert!(pages[4].contains("p5"));
    }

    #[test]
    fn password_protected_document_is_encrypted_failure() {
        let bytes = encrypted_pdf_with_pages(&["Geheim"], "s3cret");
        let err = leading_pages(&bytes, 5).unwrap_err();
        assert!(
            matches!(
                err,
                FetchError::Document {
                    kind: DocumentKind::Encrypted,
                    ..
                }
            ),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn empty_user_password_document_is_read() {
        let bytes = encrypted_pdf_with_pages(&["Openbaar"], "");
        let pages = leading_pages(&bytes, 5).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains("Openbaar"));
    }
}
