//! Application configuration for ProposalKit.
//!
//! User config lives at `~/.proposalkit/proposalkit.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ProposalKitError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "proposalkit.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".proposalkit";

// ---------------------------------------------------------------------------
// Config structs (matching proposalkit.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Document discovery.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Organization segmentation thresholds.
    #[serde(default)]
    pub segmenter: SegmenterConfig,

    /// Duplicate detection.
    #[serde(default)]
    pub dedup: DedupConfig,

    /// Stage output files.
    #[serde(default)]
    pub output: OutputConfig,

    /// Catalog import.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// `[scan]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Document extension to collect (without the dot).
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Editor lock files start with this prefix and are ignored.
    #[serde(default = "default_lock_prefix")]
    pub lock_prefix: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            lock_prefix: default_lock_prefix(),
        }
    }
}

fn default_extension() -> String {
    "docx".into()
}
fn default_lock_prefix() -> String {
    "~$".into()
}

/// `[segmenter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Paragraphs at or above this many characters are prose, never names or URL lines.
    #[serde(default = "default_max_paragraph_chars")]
    pub max_paragraph_chars: usize,

    /// Names have fewer whitespace-separated tokens than this.
    #[serde(default = "default_max_name_words")]
    pub max_name_words: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_paragraph_chars: default_max_paragraph_chars(),
            max_name_words: default_max_name_words(),
        }
    }
}

fn default_max_paragraph_chars() -> usize {
    200
}
fn default_max_name_words() -> usize {
    15
}

/// `[dedup]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Title pairs must be strictly more similar than this to be reported.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Number of leading title words forming a topic key.
    #[serde(default = "default_topic_words")]
    pub topic_words: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            topic_words: default_topic_words(),
        }
    }
}

fn default_similarity_threshold() -> f64 {
    0.85
}
fn default_topic_words() -> usize {
    5
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory stage files are read from and written to.
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    ".".into()
}

/// `[catalog]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// libSQL database file.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Import only current and upcoming resources.
    #[serde(default)]
    pub active_only: bool,

    /// Rows written per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            active_only: false,
            batch_size: default_batch_size(),
        }
    }
}

fn default_db_path() -> String {
    "catalog.db".into()
}
fn default_batch_size() -> usize {
    10
}

impl AppConfig {
    /// Reject values that would make the stages meaningless.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.dedup.similarity_threshold;
        if !(0.0..1.0).contains(&threshold) {
            return Err(ProposalKitError::config(format!(
                "dedup.similarity_threshold must be in [0, 1), got {threshold}"
            )));
        }
        if self.dedup.topic_words == 0 {
            return Err(ProposalKitError::config("dedup.topic_words must be at least 1"));
        }
        if self.catalog.batch_size == 0 {
            return Err(ProposalKitError::config("catalog.batch_size must be at least 1"));
        }
        if self.scan.extension.trim_start_matches('.').is_empty() {
            return Err(ProposalKitError::config("scan.extension must not be empty"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.proposalkit/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ProposalKitError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.proposalkit/proposalkit.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ProposalKitError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        ProposalKitError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ProposalKitError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ProposalKitError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ProposalKitError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("similarity_threshold"));
        assert!(toml_str.contains("lock_prefix"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.segmenter.max_paragraph_chars, 200);
        assert_eq!(parsed.segmenter.max_name_words, 15);
        assert_eq!(parsed.dedup.topic_words, 5);
        assert_eq!(parsed.catalog.batch_size, 10);
        assert_eq!(parsed.scan.extension, "docx");
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[dedup]
similarity_threshold = 0.9

[catalog]
active_only = true
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.dedup.similarity_threshold, 0.9);
        assert_eq!(config.dedup.topic_words, 5);
        assert!(config.catalog.active_only);
        assert_eq!(config.scan.lock_prefix, "~$");
    }

    #[test]
    fn validate_rejects_out_of_range_threshold() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.dedup.similarity_threshold = 1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("similarity_threshold"));
    }

    #[test]
    fn load_config_from_rejects_invalid_file() {
        let path = std::env::temp_dir().join(format!("pk_config_{}.toml", uuid::Uuid::now_v7()));
        std::fs::write(&path, "[catalog]\nbatch_size = 0\n").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("batch_size"));

        let _ = std::fs::remove_file(&path);
    }
}
