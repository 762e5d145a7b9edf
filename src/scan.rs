//! Input directory discovery.
//!
//! One discovery pass lists the `.pdf` entries directly inside the watched
//! directory. Matching is case-sensitive — `scan.PDF` is left alone.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::PathBuf;
use walkdir::WalkDir;

use crate::config::Config;

pub fn scan_input_dir(config: &Config) -> Result<Vec<PathBuf>> {
    let root = &config.watch.input_dir;
    if !root.exists() {
        bail!("input directory does not exist: {}", root.display());
    }

    let include_set = build_globset(&["*.pdf".to_string()])?;

    let mut paths = Vec::new();

    // max_depth(1): files dropped into the directory itself, no recursion.
    let walker = WalkDir::new(root).min_depth(1).max_depth(1);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if !include_set.is_match(&name) {
            continue;
        }

        paths.push(entry.into_path());
    }

    // Sort for deterministic ordering
    paths.sort();

    Ok(paths)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
