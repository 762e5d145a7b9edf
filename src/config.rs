use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub watch: WatchConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WatchConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct OcrConfig {
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_ocr_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            dpi: default_dpi(),
            language: default_language(),
            timeout_secs: default_ocr_timeout_secs(),
        }
    }
}

fn default_dpi() -> u32 {
    300
}
fn default_language() -> String {
    "eng".to_string()
}
fn default_ocr_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct InferenceConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_inference_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_inference_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4o".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_inference_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    1
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub quarantine_dir: Option<PathBuf>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            quarantine_dir: None,
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

impl InferenceConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate watch
    if config.watch.poll_interval_secs == 0 {
        anyhow::bail!("watch.poll_interval_secs must be > 0");
    }

    if config.watch.input_dir == config.watch.output_dir {
        anyhow::bail!(
            "watch.output_dir must differ from watch.input_dir — a renamed file would be rediscovered on the next pass"
        );
    }

    // Validate ocr
    if config.ocr.dpi == 0 {
        anyhow::bail!("ocr.dpi must be > 0");
    }

    if config.ocr.timeout_secs == 0 {
        anyhow::bail!("ocr.timeout_secs must be > 0");
    }

    // Validate inference
    match config.inference.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown inference provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    // Validate retry
    if config.retry.max_attempts == 0 {
        anyhow::bail!("retry.max_attempts must be >= 1");
    }

    if let Some(quarantine) = &config.retry.quarantine_dir {
        if quarantine == &config.watch.input_dir {
            anyhow::bail!("retry.quarantine_dir must differ from watch.input_dir");
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".toml").expect("create temp config");
        file.write_all(content.as_bytes()).expect("write config");
        file.flush().expect("flush config");
        file
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let file = write_config(
            r#"
[watch]
input_dir = "/tmp/in"
output_dir = "/tmp/out"
"#,
        );
        let config = load_config(file.path()).expect("load minimal config");
        assert_eq!(config.watch.poll_interval_secs, 10);
        assert_eq!(config.ocr.dpi, 300);
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.inference.provider, "openai");
        assert_eq!(config.inference.max_retries, 1);
        assert_eq!(config.retry.max_attempts, 5);
        assert!(config.retry.quarantine_dir.is_none());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let file = write_config(
            r#"
[watch]
input_dir = "/tmp/in"
output_dir = "/tmp/out"

[inference]
provider = "petrol"
"#,
        );
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn same_input_and_output_dir_is_rejected() {
        let file = write_config(
            r#"
[watch]
input_dir = "/tmp/same"
output_dir = "/tmp/same"
"#,
        );
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let file = write_config(
            r#"
[watch]
input_dir = "/tmp/in"
output_dir = "/tmp/out"
poll_interval_secs = 0
"#,
        );
        assert!(load_config(file.path()).is_err());
    }
}
