use color_eyre::eyre::eyre;
use color_eyre::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::filter::OaMatching;
use crate::query::ResetScope;

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file or subdirectory
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    /// Ensure the config directory exists
    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Generate default configuration template as a string
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub histogram: HistogramConfig,
    pub filters: FiltersConfig,
    pub columns: ColumnsConfig,
    pub data: DataConfig,
    pub preferences: PreferencesConfig,
    pub debug: DebugConfig,
}

/// APC histogram layout. The ceiling is also the upper end of the APC range control.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub bin_count: usize,
    pub ceiling: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FiltersConfig {
    pub reset_scope_on_dataset_switch: ResetScope,
    pub oa_matching: OaMatching,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    /// Whether the CSVs carry the Scimago Rank / Quartile / H index columns
    pub scimago_columns: bool,
}

/// One entry in the dataset catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    pub id: String,
    pub label: String,
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory or http(s) URL prefix that source files are resolved against
    pub base: String,
    pub default_source: String,
    /// Source id whose empty-result message says the list only covers biology
    pub all_fields_source: String,
    pub sources: Vec<DataSourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesConfig {
    pub enabled: bool,
    pub key: String,
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            histogram: HistogramConfig::default(),
            filters: FiltersConfig::default(),
            columns: ColumnsConfig::default(),
            data: DataConfig::default(),
            preferences: PreferencesConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            bin_count: 16,
            ceiling: 5000,
        }
    }
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            reset_scope_on_dataset_switch: ResetScope::FieldAndRangeOnly,
            oa_matching: OaMatching::Prefix,
        }
    }
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            scimago_columns: true,
        }
    }
}

fn source(id: &str, label: &str) -> DataSourceConfig {
    DataSourceConfig {
        id: id.to_string(),
        label: label.to_string(),
        file: format!("{id}.csv"),
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base: "data".to_string(),
            default_source: "generalist".to_string(),
            all_fields_source: "all_biology".to_string(),
            sources: vec![
                source("all_biology", "All fields"),
                source("anatomy_physiology", "Anatomy & Physiology"),
                source("generalist", "Generalist"),
                source("cancer", "Cancer"),
                source("development", "Development"),
                source("ecology_evolution", "Ecology & Evolution"),
                source("genetics_genomics", "Genetics & Genomics"),
                source("immunology", "Immunology"),
                source("molecular_cellular_biology", "Molecular & Cellular Biology"),
                source("neurosciences", "Neurosciences"),
                source("plants", "Plants"),
            ],
        }
    }
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            key: "wtp_global_state_v1".to_string(),
            max_bytes: 64 * 1024,
        }
    }
}

impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let config_manager = ConfigManager::new(app_name)?;
        Self::load_with_manager(&config_manager)
    }

    /// Load configuration from the given config directory
    pub fn load_with_manager(config_manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();

        if let Some(user_config) = Self::load_user_config(config_manager)? {
            config.merge(user_config);
        }

        config.validate()?;

        Ok(config)
    }

    fn load_user_config(config_manager: &ConfigManager) -> Result<Option<AppConfig>> {
        let config_path = config_manager.config_path("config.toml");

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map(Some).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.histogram.merge(other.histogram);
        self.filters.merge(other.filters);
        self.columns.merge(other.columns);
        self.data.merge(other.data);
        self.preferences.merge(other.preferences);
        self.debug.merge(other.debug);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if self.histogram.bin_count == 0 {
            return Err(eyre!("histogram.bin_count must be greater than 0"));
        }

        if self.histogram.ceiling == 0 {
            return Err(eyre!("histogram.ceiling must be greater than 0"));
        }

        if self.preferences.key.trim().is_empty() {
            return Err(eyre!("preferences.key must not be empty"));
        }

        self.data.validate()
    }
}

impl HistogramConfig {
    pub fn merge(&mut self, other: Self) {
        let default = HistogramConfig::default();
        if other.bin_count != default.bin_count {
            self.bin_count = other.bin_count;
        }
        if other.ceiling != default.ceiling {
            self.ceiling = other.ceiling;
        }
    }
}

impl FiltersConfig {
    pub fn merge(&mut self, other: Self) {
        let default = FiltersConfig::default();
        if other.reset_scope_on_dataset_switch != default.reset_scope_on_dataset_switch {
            self.reset_scope_on_dataset_switch = other.reset_scope_on_dataset_switch;
        }
        if other.oa_matching != default.oa_matching {
            self.oa_matching = other.oa_matching;
        }
    }
}

impl ColumnsConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ColumnsConfig::default();
        if other.scimago_columns != default.scimago_columns {
            self.scimago_columns = other.scimago_columns;
        }
    }
}

impl DataConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DataConfig::default();
        if other.base != default.base {
            self.base = other.base;
        }
        if other.default_source != default.default_source {
            self.default_source = other.default_source;
        }
        if other.all_fields_source != default.all_fields_source {
            self.all_fields_source = other.all_fields_source;
        }
        if other.sources != default.sources {
            self.sources = other.sources;
        }
    }

    /// Look up a catalog entry by id
    pub fn source(&self, id: &str) -> Option<&DataSourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }

    fn validate(&self) -> Result<()> {
        let id_pattern =
            Regex::new(r"^[A-Za-z0-9_-]+$").map_err(|e| eyre!("Invalid id pattern: {}", e))?;
        let mut seen = HashSet::new();
        for source in &self.sources {
            if !id_pattern.is_match(&source.id) {
                return Err(eyre!(
                    "Invalid data source id '{}': use letters, digits, '_' or '-'",
                    source.id
                ));
            }
            if !seen.insert(source.id.as_str()) {
                return Err(eyre!("Duplicate data source id '{}'", source.id));
            }
            if source.file.trim().is_empty() {
                return Err(eyre!("Data source '{}' has an empty file", source.id));
            }
        }
        if !self.sources.is_empty() && self.source(&self.default_source).is_none() {
            return Err(eyre!(
                "default_source '{}' is not in the source list",
                self.default_source
            ));
        }
        Ok(())
    }
}

impl PreferencesConfig {
    pub fn merge(&mut self, other: Self) {
        let default = PreferencesConfig::default();
        if other.enabled != default.enabled {
            self.enabled = other.enabled;
        }
        if other.key != default.key {
            self.key = other.key;
        }
        if other.max_bytes != default.max_bytes {
            self.max_bytes = other.max_bytes;
        }
    }
}

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DebugConfig::default();
        if other.enabled != default.enabled {
            self.enabled = other.enabled;
        }
    }
}

// Default configuration template
const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");
