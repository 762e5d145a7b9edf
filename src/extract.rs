//! PDF text extraction with OCR fallback.
//!
//! The text layer is tried first; when it yields nothing (scanned documents
//! have no embedded text), the OCR engine takes over. Either stage failing is
//! not an error for the document — it is logged and demoted to empty output,
//! so the pipeline can still surface a title from whatever text remains.

use std::path::Path;
use tracing::{debug, warn};

/// Extraction error. Recovered inside [`extract_with_fallback`]; only the
/// individual [`TextSource`] implementations ever return it.
#[derive(Debug)]
pub enum ExtractError {
    Pdf(String),
    Ocr(String),
    Io(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Pdf(e) => write!(f, "text layer extraction failed: {}", e),
            ExtractError::Ocr(e) => write!(f, "OCR failed: {}", e),
            ExtractError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// A source of page-ordered text for a PDF file.
///
/// Two production implementations exist — the embedded text layer
/// ([`TextLayer`]) and rasterizing OCR ([`crate::ocr::PopplerOcr`]) — and
/// tests substitute fakes to drive the coordinator.
pub trait TextSource: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Embedded text layer, read with pdf-extract. Pages are concatenated in
/// page order by the library.
pub struct TextLayer;

impl TextSource for TextLayer {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = std::fs::read(path).map_err(|e| ExtractError::Io(e.to_string()))?;
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
    }
}

/// Extract text for one PDF: text layer first, OCR when the text layer
/// yields nothing usable. Never errors — a failed stage counts as empty
/// output, and a document with no recoverable text returns an empty string.
pub fn extract_with_fallback(
    text_layer: &dyn TextSource,
    ocr: &dyn TextSource,
    path: &Path,
) -> String {
    let text = match text_layer.extract_text(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("{} for {}", e, path.display());
            String::new()
        }
    };

    if !text.trim().is_empty() {
        debug!(
            "text layer yielded {} chars for {}",
            text.len(),
            path.display()
        );
        return text;
    }

    debug!("no text layer in {}, falling back to OCR", path.display());
    match ocr.extract_text(path) {
        Ok(text) => {
            debug!("OCR yielded {} chars for {}", text.len(), path.display());
            text
        }
        Err(e) => {
            warn!("{} for {}", e, path.display());
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    struct FixedText(&'static str);

    impl TextSource for FixedText {
        fn extract_text(&self, _path: &Path) -> Result<String, ExtractError> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    impl TextSource for Failing {
        fn extract_text(&self, _path: &Path) -> Result<String, ExtractError> {
            Err(ExtractError::Pdf("boom".to_string()))
        }
    }

    struct Counting {
        calls: Arc<AtomicUsize>,
        text: &'static str,
    }

    impl TextSource for Counting {
        fn extract_text(&self, _path: &Path) -> Result<String, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.to_string())
        }
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let mut file = NamedTempFile::with_suffix(".pdf").expect("create temp file");
        file.write_all(b"not a pdf").expect("write temp file");
        file.flush().expect("flush temp file");

        let err = TextLayer.extract_text(file.path()).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn missing_file_returns_io_error() {
        let err = TextLayer
            .extract_text(Path::new("/nonexistent/doc.pdf"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::Io(_)));
    }

    #[test]
    fn text_layer_result_skips_ocr() {
        let calls = Arc::new(AtomicUsize::new(0));
        let ocr = Counting {
            calls: calls.clone(),
            text: "ocr text",
        };

        let text = extract_with_fallback(&FixedText("embedded text"), &ocr, Path::new("a.pdf"));
        assert_eq!(text, "embedded text");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn whitespace_only_text_layer_triggers_ocr() {
        let calls = Arc::new(AtomicUsize::new(0));
        let ocr = Counting {
            calls: calls.clone(),
            text: "ocr text",
        };

        let text = extract_with_fallback(&FixedText("  \n\t "), &ocr, Path::new("a.pdf"));
        assert_eq!(text, "ocr text");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn text_layer_failure_triggers_ocr() {
        let calls = Arc::new(AtomicUsize::new(0));
        let ocr = Counting {
            calls: calls.clone(),
            text: "recovered",
        };

        let text = extract_with_fallback(&Failing, &ocr, Path::new("a.pdf"));
        assert_eq!(text, "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn both_stages_failing_yields_empty_text() {
        let text = extract_with_fallback(&Failing, &Failing, Path::new("a.pdf"));
        assert_eq!(text, "");
    }
}
