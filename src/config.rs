//! Configuration module for floatrag.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `FR_` and use double
//! underscores to separate nested levels:
//! - `FR_RETRIEVAL__TIMEOUT_SECS=60` sets `retrieval.timeout_secs`
//! - `FR_EMBEDDING__MODEL=BGESmallENV15` sets `embedding.model`
//! - `FR_DEBUG=true` sets the top-level `debug`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory holding the settings file and, by default, the index.
pub const CONFIG_DIR: &str = ".floatrag";

/// Settings file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "settings.toml";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory holding the persisted document index
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Global debug mode
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// fastembed model name, e.g. "AllMiniLML6V2"
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Show the progress bar while model weights download
    #[serde(default = "default_true")]
    pub show_download_progress: bool,

    /// Where model weights are cached; defaults to the user cache directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RetrievalConfig {
    /// Documents handed to the generator per question
    #[serde(default = "default_context_limit")]
    pub context_limit: usize,

    /// Default result count for `search`
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Upper bound on answering one question
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    pub json: bool,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_index_path() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("index")
}
fn default_true() -> bool {
    true
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_context_limit() -> usize {
    5
}
fn default_search_limit() -> usize {
    10
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            index_path: default_index_path(),
            debug: false,
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            show_download_progress: true,
            cache_dir: None,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            context_limit: default_context_limit(),
            search_limit: default_search_limit(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl RetrievalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl EmbeddingConfig {
    /// Directory model weights are cached in.
    pub fn models_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("floatrag")
                .join("models")
        })
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));

        Self::load_from(config_path).map(|mut settings| {
            // A relative index path is resolved against the workspace root
            if settings.index_path.is_relative() {
                if let Some(root) = Self::workspace_root() {
                    settings.index_path = root.join(&settings.index_path);
                }
            }
            settings
        })
    }

    /// Load configuration from a specific file, still honouring `FR_` variables
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore (__) separates nested levels
            .merge(Env::prefixed("FR_").split("__"))
            .extract()
            .map_err(Box::new)
    }

    /// Find the settings file by looking for `.floatrag` from the current
    /// directory up to the root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Get the workspace root directory (where `.floatrag` is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::workspace_root_from(&current)
    }

    fn workspace_root_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Create a default settings file with helpful comments in `dir`
    pub fn init_config_file(
        dir: impl AsRef<Path>,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = format!(
            r#"# floatrag configuration file

# Version of the configuration schema
version = {version}

# Directory of the document index (relative to the workspace root)
index_path = "{index_path}"

# Global debug mode
debug = false

[embedding]
# fastembed model used for documents and questions.
# Changing it makes an existing index unreadable; re-extract after switching.
# Supported: AllMiniLML6V2, AllMiniLML12V2, BGESmallENV15, BGEBaseENV15
model = "{model}"

# Show a progress bar while the model downloads on first use
show_download_progress = true

# Where model weights are cached (defaults to the user cache directory)
# cache_dir = "/path/to/models"

[retrieval]
# Documents used as context for each answer
context_limit = {context_limit}

# Default number of results for `floatrag search`
search_limit = {search_limit}

# Seconds before a question is abandoned
timeout_secs = {timeout_secs}

[logging]
# Filter directive; RUST_LOG takes precedence when set
level = "{level}"

# Emit JSON lines on stderr
json = false
"#,
            version = default_version(),
            index_path = default_index_path().display(),
            model = default_embedding_model(),
            context_limit = default_context_limit(),
            search_limit = default_search_limit(),
            timeout_secs = default_timeout_secs(),
            level = default_log_level(),
        );

        std::fs::write(&config_path, template)?;
        tracing::info!(path = %config_path.display(), force, "wrote configuration");

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const OVERRIDES: [&str; 2] = ["FR_DEBUG", "FR_RETRIEVAL__TIMEOUT_SECS"];

    // Loads without variables leaking in from concurrently running tests
    fn load_clean(path: &Path) -> Settings {
        temp_env::with_vars_unset(OVERRIDES, || Settings::load_from(path).unwrap())
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.index_path, PathBuf::from(".floatrag/index"));
        assert_eq!(settings.embedding.model, "AllMiniLML6V2");
        assert_eq!(settings.retrieval.context_limit, 5);
        assert_eq!(settings.retrieval.timeout(), Duration::from_secs(30));
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
[retrieval]
search_limit = 3

[logging]
json = true
"#;
        fs::write(&config_path, toml_content).unwrap();

        let settings = load_clean(&config_path);
        assert_eq!(settings.retrieval.search_limit, 3);
        assert!(settings.logging.json);
        // Untouched values keep their defaults
        assert_eq!(settings.retrieval.context_limit, 5);
        assert_eq!(settings.logging.level, "info");
        assert!(settings.embedding.show_download_progress);
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(
            &config_path,
            "[retrieval]\ncontext_limit = 8\ntimeout_secs = 12\n",
        )
        .unwrap();

        temp_env::with_vars(
            [(OVERRIDES[1], Some("60")), (OVERRIDES[0], Some("true"))],
            || {
                let settings = Settings::load_from(&config_path).unwrap();
                assert_eq!(settings.retrieval.timeout_secs, 60);
                assert_eq!(settings.retrieval.context_limit, 8);
                assert!(settings.debug);
            },
        );
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.embedding.model = "BGESmallENV15".to_string();
        settings.retrieval.context_limit = 2;
        settings.save(&config_path).unwrap();

        let loaded = load_clean(&config_path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_init_template_parses_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = Settings::init_config_file(temp_dir.path(), false).unwrap();
        assert_eq!(path, temp_dir.path().join(".floatrag/settings.toml"));

        let loaded = load_clean(&path);
        assert_eq!(loaded, Settings::default());

        assert!(Settings::init_config_file(temp_dir.path(), false).is_err());
        assert!(Settings::init_config_file(temp_dir.path(), true).is_ok());
    }

    #[test]
    fn test_workspace_root_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join(".floatrag")).unwrap();
        let nested = temp_dir.path().join("data").join("2023");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(
            Settings::workspace_root_from(&nested),
            Some(temp_dir.path().to_path_buf())
        );
    }

    #[test]
    fn test_models_dir_override() {
        let config = EmbeddingConfig {
            cache_dir: Some(PathBuf::from("/tmp/models")),
            ..EmbeddingConfig::default()
        };
        assert_eq!(config.models_dir(), PathBuf::from("/tmp/models"));
        assert!(
            EmbeddingConfig::default()
                .models_dir()
                .ends_with("floatrag/models")
        );
    }
}
