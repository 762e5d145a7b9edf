//! Per-document orchestration.
//!
//! Runs the full pipeline for one file — extract → infer → sanitize →
//! rename — and walks a discovery pass over the input directory. Failures
//! are isolated per document: one bad PDF is logged and left in place, and
//! the rest of the batch proceeds.
//!
//! A document that keeps failing is not retried forever. The processor keeps
//! an in-memory attempt counter per path; once `retry.max_attempts` is
//! reached the file is moved to the quarantine directory when one is
//! configured, or ignored for the rest of the process lifetime otherwise.
//! The counters are deliberately not persisted — a restart gives every file
//! a fresh start.

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::extract::{extract_with_fallback, TextLayer, TextSource};
use crate::infer::{create_model, TitleModel};
use crate::ocr::PopplerOcr;
use crate::rename::{move_into, FilenameComponents};
use crate::sanitize::sanitize_title;
use crate::scan;

/// Counters for one discovery pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub discovered: usize,
    pub renamed: usize,
    pub failed: usize,
    pub quarantined: usize,
    pub skipped: usize,
}

pub struct Processor {
    config: Config,
    text_layer: Box<dyn TextSource>,
    ocr: Box<dyn TextSource>,
    model: Box<dyn TitleModel>,
    attempts: HashMap<PathBuf, u32>,
    abandoned: HashSet<PathBuf>,
}

impl Processor {
    /// Wire the production collaborators from configuration.
    pub fn new(config: Config) -> Result<Self> {
        let model = create_model(&config.inference)?;
        let ocr = Box::new(PopplerOcr::new(&config.ocr));
        Ok(Self::with_collaborators(
            config,
            Box::new(TextLayer),
            ocr,
            model,
        ))
    }

    /// Inject collaborators directly. Tests use this to substitute fakes for
    /// the text layer, the OCR engine, and the title model.
    pub fn with_collaborators(
        config: Config,
        text_layer: Box<dyn TextSource>,
        ocr: Box<dyn TextSource>,
        model: Box<dyn TitleModel>,
    ) -> Self {
        Self {
            config,
            text_layer,
            ocr,
            model,
            attempts: HashMap::new(),
            abandoned: HashSet::new(),
        }
    }

    /// Run the full pipeline for one file and return the destination path.
    ///
    /// On success the file no longer exists at `path`; on failure it is
    /// untouched at its original location.
    pub fn process(&self, path: &Path) -> Result<PathBuf> {
        let text = extract_with_fallback(self.text_layer.as_ref(), self.ocr.as_ref(), path);

        let raw_title = self
            .model
            .infer_title(&text)
            .with_context(|| format!("title inference failed for {}", path.display()))?;

        let mut title = sanitize_title(&raw_title);
        if title.is_empty() {
            title = fallback_title(path);
            warn!(
                "model returned a degenerate title ({:?}) for {}; using fallback '{}'",
                raw_title,
                path.display(),
                title
            );
        }

        let output_dir = &self.config.watch.output_dir;
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("failed to create {}", output_dir.display()))?;

        let components = FilenameComponents::derive(path, &title);
        move_into(path, output_dir, &components.file_name())
    }

    /// One pass over the input directory: process every `.pdf` in listing
    /// order, isolating failures per file.
    pub fn run_pass(&mut self) -> Result<PassSummary> {
        let files = scan::scan_input_dir(&self.config)?;

        let mut summary = PassSummary {
            discovered: files.len(),
            ..Default::default()
        };

        for path in files {
            if self.abandoned.contains(&path) {
                summary.skipped += 1;
                continue;
            }

            match self.process(&path) {
                Ok(destination) => {
                    info!("renamed {} -> {}", path.display(), destination.display());
                    self.attempts.remove(&path);
                    summary.renamed += 1;
                }
                Err(e) => {
                    error!("failed to process {}: {:#}", path.display(), e);
                    summary.failed += 1;
                    if self.record_failure(&path) {
                        summary.quarantined += 1;
                    }
                }
            }
        }

        Ok(summary)
    }

    /// Bump the attempt counter for a failed document and apply the
    /// exhaustion policy. Returns true when the file was quarantined.
    fn record_failure(&mut self, path: &Path) -> bool {
        let count = {
            let entry = self.attempts.entry(path.to_path_buf()).or_insert(0);
            *entry += 1;
            *entry
        };

        if count < self.config.retry.max_attempts {
            return false;
        }

        match self.config.retry.quarantine_dir.clone() {
            Some(dir) => match quarantine(path, &dir) {
                Ok(destination) => {
                    warn!(
                        "quarantined {} -> {} after {} failed attempts",
                        path.display(),
                        destination.display(),
                        count
                    );
                    self.attempts.remove(path);
                    true
                }
                Err(e) => {
                    // Quarantine move failed; counter stays exhausted so the
                    // next failure retries the move.
                    error!("failed to quarantine {}: {:#}", path.display(), e);
                    false
                }
            },
            None => {
                warn!(
                    "giving up on {} after {} failed attempts; ignored until restart",
                    path.display(),
                    count
                );
                self.attempts.remove(path);
                self.abandoned.insert(path.to_path_buf());
                false
            }
        }
    }
}

/// Title of last resort: the sanitized original basename stem, or
/// `untitled` when even that comes out empty.
fn fallback_title(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let title = sanitize_title(&stem);
    if title.is_empty() {
        "untitled".to_string()
    } else {
        title
    }
}

fn quarantine(path: &Path, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "unnamed.pdf".to_string());

    move_into(path, dir, &name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_title_uses_the_sanitized_stem() {
        assert_eq!(fallback_title(Path::new("/in/tax notes.pdf")), "tax_notes");
        assert_eq!(
            fallback_title(Path::new("/in/20230115_scan.pdf")),
            "20230115_scan"
        );
    }

    #[test]
    fn fallback_title_never_comes_out_empty() {
        assert_eq!(fallback_title(Path::new("/in/???.pdf")), "untitled");
    }
}
