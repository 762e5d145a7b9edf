//! Rasterizing OCR for PDFs without a text layer.
//!
//! Shells out to poppler's `pdftoppm` to render each page as a PNG in a
//! scratch directory, then runs `tesseract` over each page image. Page texts
//! are joined with newline separators in page order. A page whose OCR run
//! fails is skipped — one bad page must not block the rest of the document.
//!
//! Both tools are invoked with a deadline: a child still running after
//! `ocr.timeout_secs` is killed and the stage reports failure, so a wedged
//! rasterizer cannot stall the pipeline forever.

use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::OcrConfig;
use crate::extract::{ExtractError, TextSource};

pub struct PopplerOcr {
    dpi: u32,
    language: String,
    timeout: Duration,
}

impl PopplerOcr {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            dpi: config.dpi,
            language: config.language.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// OCR a single page image. Tesseract writes `<base>.txt` next to the
    /// image; reading that back avoids holding a stdout pipe on a child we
    /// may have to kill.
    fn ocr_page(&self, image: &Path) -> Result<String, ExtractError> {
        let out_base = image.with_extension("");

        let mut child = Command::new("tesseract")
            .arg(image)
            .arg(&out_base)
            .arg("-l")
            .arg(&self.language)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| ExtractError::Ocr(format!("failed to run tesseract: {}", e)))?;

        let status = wait_with_deadline(&mut child, self.timeout)
            .map_err(|e| ExtractError::Ocr(format!("tesseract: {}", e)))?;
        if !status.success() {
            return Err(ExtractError::Ocr(format!(
                "tesseract exited with {}",
                status
            )));
        }

        let text = std::fs::read_to_string(out_base.with_extension("txt"))
            .map_err(|e| ExtractError::Ocr(format!("failed to read tesseract output: {}", e)))?;

        // Tesseract terminates each page with a form feed.
        Ok(text.replace('\x0c', ""))
    }
}

impl TextSource for PopplerOcr {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        let scratch = tempfile::Builder::new()
            .prefix("titledrop-ocr-")
            .tempdir()
            .map_err(|e| ExtractError::Io(e.to_string()))?;

        // pdftoppm -png -r <dpi> input.pdf <scratch>/page
        let mut child = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(path)
            .arg(scratch.path().join("page"))
            .spawn()
            .map_err(|e| ExtractError::Ocr(format!("failed to run pdftoppm: {}", e)))?;

        let status = wait_with_deadline(&mut child, self.timeout)
            .map_err(|e| ExtractError::Ocr(format!("pdftoppm: {}", e)))?;
        if !status.success() {
            return Err(ExtractError::Ocr(format!(
                "pdftoppm exited with {}",
                status
            )));
        }

        let pages = page_images(scratch.path()).map_err(|e| ExtractError::Io(e.to_string()))?;
        if pages.is_empty() {
            return Err(ExtractError::Ocr(
                "pdftoppm produced no page images".to_string(),
            ));
        }

        let mut text = String::new();
        for (page_num, image) in pages {
            debug!("running OCR on page {} of {}", page_num, path.display());
            match self.ocr_page(&image) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push('\n');
                }
                Err(e) => {
                    warn!("skipping page {} of {}: {}", page_num, path.display(), e);
                }
            }
        }

        Ok(text)
    }
}

/// Discover `page-N.png` files in the scratch directory, sorted by page
/// number. pdftoppm zero-pads page numbers only past 9, so a lexical sort
/// would misplace page 10 — sort on the parsed number instead.
fn page_images(dir: &Path) -> std::io::Result<Vec<(usize, PathBuf)>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            continue;
        }
        if let Some(num) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(page_number)
        {
            images.push((num, path));
        }
    }
    images.sort_by_key(|k| k.0);
    Ok(images)
}

/// Parse the page number from a pdftoppm output stem: `page-3` -> 3.
fn page_number(stem: &str) -> Option<usize> {
    let idx = stem.rfind('-')?;
    stem[idx + 1..].parse().ok()
}

/// Poll the child until it exits or the deadline passes; on expiry the child
/// is killed and reaped.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Duration,
) -> Result<std::process::ExitStatus, String> {
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if started.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(format!("timed out after {}s", timeout.as_secs()));
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => return Err(e.to_string()),
        }
    }
}
