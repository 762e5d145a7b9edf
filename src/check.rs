//! Configuration and collaborator health checks.

use anyhow::Result;
use std::process::{Command, Stdio};

use crate::config::Config;

pub fn run_check(config: &Config) -> Result<()> {
    println!("{:<18} {:<40} OK", "COMPONENT", "DETAIL");

    let input = &config.watch.input_dir;
    println!(
        "{:<18} {:<40} {}",
        "input dir",
        input.display().to_string(),
        input.is_dir()
    );

    let output = &config.watch.output_dir;
    let output_detail = if output.is_dir() {
        output.display().to_string()
    } else {
        format!("{} (will be created)", output.display())
    };
    println!("{:<18} {:<40} {}", "output dir", output_detail, true);

    println!(
        "{:<18} {:<40} {}",
        "pdftoppm",
        format!("rasterizer, {} dpi", config.ocr.dpi),
        command_available("pdftoppm")
    );
    println!(
        "{:<18} {:<40} {}",
        "tesseract",
        format!("ocr, language '{}'", config.ocr.language),
        command_available("tesseract")
    );

    let key_detail = format!("{} ({})", config.inference.provider, config.inference.model);
    let key_ok = !config.inference.is_enabled()
        || std::env::var(&config.inference.api_key_env).is_ok();
    println!("{:<18} {:<40} {}", "inference", key_detail, key_ok);
    if config.inference.is_enabled() && !key_ok {
        println!(
            "{:<18} {:<40} {}",
            "", format!("set {}", config.inference.api_key_env), false
        );
    }

    Ok(())
}

/// A tool counts as available when it can be spawned at all; `-v` keeps both
/// poppler and tesseract quiet and fast.
fn command_available(name: &str) -> bool {
    Command::new(name)
        .arg("-v")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonexistent_command_is_unavailable() {
        assert!(!command_available("titledrop-no-such-tool"));
    }
}
