//! Application configuration for jaarverslag.
//!
//! User config lives at `~/.jaarverslag/jaarverslag.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{JaarverslagError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "jaarverslag.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".jaarverslag";

/// Noise vocabulary stripped from organisation names.
///
/// The Dutch terms are the boilerplate found on the source portals; the
/// English ones cover translated report titles.
pub const DEFAULT_NOISE_WORDS: &[&str] = &[
    "Jaarverslag",
    "Jaarrekening",
    "Concept",
    "Rapportage",
    "Interne",
    "annual report",
    "financial statement",
    "draft",
    "report",
    "internal",
];

// ---------------------------------------------------------------------------
// Config structs (matching jaarverslag.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// HTTP settings for document downloads.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Name normalization vocabulary.
    #[serde(default)]
    pub normalize: NormalizeConfig,

    /// vlaanderen.be collector settings.
    #[serde(default)]
    pub vlaanderen: VlaanderenConfig,

    /// Table output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory receiving per-source and merged CSV tables.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Number of leading document pages whose text is kept.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Concurrent document downloads.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_pages: default_max_pages(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_output_dir() -> String {
    "data".into()
}
fn default_max_pages() -> usize {
    5
}
fn default_concurrency() -> usize {
    8
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum redirects followed before giving up.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Documents larger than this are not parsed.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_redirects: default_max_redirects(),
            max_document_bytes: default_max_document_bytes(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_max_redirects() -> usize {
    10
}
fn default_max_document_bytes() -> u64 {
    100 * 1024 * 1024
}

/// `[normalize]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Whole-word tokens removed (case-insensitively) from organisation names.
    #[serde(default = "default_noise_words")]
    pub noise_words: Vec<String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            noise_words: default_noise_words(),
        }
    }
}

fn default_noise_words() -> Vec<String> {
    DEFAULT_NOISE_WORDS.iter().map(|w| (*w).to_string()).collect()
}

/// `[vlaanderen]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VlaanderenConfig {
    /// Portal origin; listing and publication paths are joined onto it.
    #[serde(default = "default_vlaanderen_base_url")]
    pub base_url: String,

    /// Number of listing pages (offsets `0..listing_pages`).
    #[serde(default = "default_listing_pages")]
    pub listing_pages: u32,
}

impl Default for VlaanderenConfig {
    fn default() -> Self {
        Self {
            base_url: default_vlaanderen_base_url(),
            listing_pages: default_listing_pages(),
        }
    }
}

fn default_vlaanderen_base_url() -> String {
    "https://www.vlaanderen.be".into()
}
fn default_listing_pages() -> u32 {
    23
}

/// `[output]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Append a `Fetch Status` column so empty documents and failed fetches
    /// stay distinguishable on disk.
    #[serde(default)]
    pub include_status_column: bool,
}

// ---------------------------------------------------------------------------
// Fetch options (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime fetch configuration, derived from the config file.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum redirects followed.
    pub max_redirects: usize,
    /// Upper bound on downloaded document size.
    pub max_document_bytes: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FetchOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.fetch.timeout_secs),
            max_redirects: config.fetch.max_redirects,
            max_document_bytes: config.fetch.max_document_bytes,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.jaarverslag/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| JaarverslagError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.jaarverslag/jaarverslag.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| JaarverslagError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        JaarverslagError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| JaarverslagError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| JaarverslagError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| JaarverslagError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject values that would make a run meaningless.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.defaults.max_pages == 0 {
        return Err(JaarverslagError::config("defaults.max_pages must be at least 1"));
    }
    if config.defaults.concurrency == 0 {
        return Err(JaarverslagError::config("defaults.concurrency must be at least 1"));
    }
    if config.fetch.timeout_secs == 0 {
        return Err(JaarverslagError::config("fetch.timeout_secs must be at least 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_dir"));
        assert!(toml_str.contains("Jaarverslag"));
        assert!(toml_str.contains("vlaanderen.be"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.max_pages, 5);
        assert_eq!(parsed.vlaanderen.listing_pages, 23);
        assert_eq!(parsed.normalize.noise_words.len(), DEFAULT_NOISE_WORDS.len());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[defaults]
concurrency = 2

[normalize]
noise_words = ["Jaarverslag"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.concurrency, 2);
        assert_eq!(config.defaults.max_pages, 5);
        assert_eq!(config.normalize.noise_words, vec!["Jaarverslag".to_string()]);
        assert!(!config.output.include_status_column);
    }

    #[test]
    fn fetch_options_from_app_config() {
        let app = AppConfig::default();
        let opts = FetchOptions::from(&app);
        assert_eq!(opts.timeout, Duration::from_secs(30));
        assert_eq!(opts.max_redirects, 10);
    }

    #[test]
    fn zero_max_pages_rejected() {
        let mut config = AppConfig::default();
        config.defaults.max_pages = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_pages"));
    }

    #[test]
    fn load_config_from_file() {
        let dir = std::env::temp_dir().join(format!("jv-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create dir");
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[output]\ninclude_status_column = true\n").expect("write");

        let config = load_config_from(&path).expect("load");
        assert!(config.output.include_status_column);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
