//! Output filename composition and the final move.

use anyhow::{bail, Context, Result};
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static DATE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{8})").expect("valid pattern"));
static RESERVED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("valid pattern"));

/// The two pieces of an output filename: an 8-digit `YYYYMMDD` date prefix
/// and a sanitized title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameComponents {
    pub date: String,
    pub title: String,
}

impl FilenameComponents {
    /// Derive the date prefix from the original basename. A basename that
    /// starts with eight digits (scanner-style `20230115_scan.pdf`) keeps
    /// that date; anything else gets the current local date.
    pub fn derive(original: &Path, title: &str) -> Self {
        let base = original
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let date = match DATE_PREFIX.captures(&base) {
            Some(caps) => caps[1].to_string(),
            None => Local::now().format("%Y%m%d").to_string(),
        };

        Self {
            date,
            title: title.to_string(),
        }
    }

    /// Compose `{date}-{title}.pdf`, escaping filesystem-reserved characters
    /// (`< > : " / \ | ? *`) to `_` across the whole composed name.
    pub fn file_name(&self) -> String {
        let name = format!("{}-{}.pdf", self.date, self.title);
        RESERVED.replace_all(&name, "_").into_owned()
    }
}

/// Move `source` into `output_dir` under `file_name`.
///
/// This is a rename, never a copy: cross-device moves fail and propagate.
/// An existing destination is refused rather than overwritten. On any
/// failure the source file is untouched at its original path.
pub fn move_into(source: &Path, output_dir: &Path, file_name: &str) -> Result<PathBuf> {
    let destination = output_dir.join(file_name);

    if destination.exists() {
        bail!("destination already exists: {}", destination.display());
    }

    std::fs::rename(source, &destination).with_context(|| {
        format!(
            "failed to move {} to {}",
            source.display(),
            destination.display()
        )
    })?;

    Ok(destination)
}
