//! Application configuration for Adit.
//!
//! User config lives at `~/.adit/adit.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AditError, Result};
use crate::types::PredicateSet;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "adit.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".adit";

/// Heading levels a markdown document can express.
pub const MAX_HEADING_DEPTH: usize = 6;

// ---------------------------------------------------------------------------
// Config structs (matching adit.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Catalog filtering and thresholds.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Table-of-contents generation for linear documents.
    #[serde(default)]
    pub toc: TocConfig,

    /// Wiki publishing target.
    #[serde(default)]
    pub wiki: WikiConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Path to the libSQL graph database.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Key of the designated root ("adit") node.
    #[serde(default = "default_root")]
    pub root: String,

    /// Maximum traversal depth from the root.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Default export output directory.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            root: default_root(),
            max_depth: default_max_depth(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_db_path() -> String {
    "adit.db".into()
}
fn default_root() -> String {
    "adit".into()
}
fn default_max_depth() -> u32 {
    10
}
fn default_output_dir() -> String {
    "out".into()
}

/// `[catalog]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Chunks shorter than this (heading markup stripped) are dropped.
    #[serde(default)]
    pub min_content_length: usize,

    /// `attribute=value` predicates a node must all match.
    #[serde(default)]
    pub include: Vec<String>,

    /// `attribute=value` predicates a node must not match.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// `[toc]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocConfig {
    /// Deepest heading level listed in the TOC; 0 disables the TOC.
    #[serde(default = "default_toc_depth")]
    pub max_depth: usize,

    /// Whether level-1 headings appear in the TOC.
    #[serde(default = "default_true")]
    pub top_level: bool,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            max_depth: default_toc_depth(),
            top_level: true,
        }
    }
}

fn default_toc_depth() -> usize {
    3
}
fn default_true() -> bool {
    true
}

/// `[wiki]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WikiConfig {
    /// Target space identifier.
    #[serde(default)]
    pub space: String,

    /// Page under which top-level documents are created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_page: Option<String>,
}

// ---------------------------------------------------------------------------
// Catalog options (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime catalog configuration, validated before any graph access.
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    /// Key of the designated root node.
    pub root: String,
    /// Maximum traversal depth (at least 1).
    pub max_depth: u32,
    /// Minimum stripped chunk length.
    pub min_content_length: usize,
    /// Active include/exclude predicates.
    pub predicates: PredicateSet,
}

impl CatalogOptions {
    /// Options for `root` with no filtering and the default depth.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            max_depth: default_max_depth(),
            min_content_length: 0,
            predicates: PredicateSet::default(),
        }
    }

    /// Reject options the catalog cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.root.trim().is_empty() {
            return Err(AditError::config("root key must not be empty"));
        }
        if self.max_depth == 0 {
            return Err(AditError::config("max_depth must be at least 1"));
        }
        Ok(())
    }
}

impl TryFrom<&AppConfig> for CatalogOptions {
    type Error = AditError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        let options = Self {
            root: config.defaults.root.clone(),
            max_depth: config.defaults.max_depth,
            min_content_length: config.catalog.min_content_length,
            predicates: PredicateSet::parse(&config.catalog.include, &config.catalog.exclude)?,
        };
        options.validate()?;
        Ok(options)
    }
}

/// TOC options for linear documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TocOptions {
    pub max_depth: usize,
    pub top_level: bool,
}

impl From<&TocConfig> for TocOptions {
    fn from(config: &TocConfig) -> Self {
        Self {
            max_depth: config.max_depth.min(MAX_HEADING_DEPTH),
            top_level: config.top_level,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.adit/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| AditError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.adit/adit.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| AditError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| AditError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| AditError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = render_config(&AppConfig::default())?;

    std::fs::write(&path, content).map_err(|e| AditError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Serialize a config as pretty TOML.
pub fn render_config(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| AditError::config(e.to_string()))
}
