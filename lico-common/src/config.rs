//! Configuration loading and root folder resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never aborts startup; it is logged and
//! the compiled defaults are used instead.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "LICO_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "lico.db";

/// Bootstrap configuration loaded from TOML
///
/// Every field is optional so that a partial file (or no file at all) still
/// yields a usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP port
    #[serde(default)]
    pub port: Option<u16>,

    /// Address to bind the HTTP listener to
    #[serde(default)]
    pub bind_address: Option<String>,

    /// Shared secret expected in `Authorization: Bearer` on cron routes
    #[serde(default)]
    pub cron_secret: Option<String>,

    /// Broadcast capacity of the automation event bus
    #[serde(default)]
    pub event_bus_capacity: Option<usize>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub insights: InsightConfig,

    #[serde(default)]
    pub sessions: SessionConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Ollama-compatible LLM endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    #[serde(default = "default_ollama_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Upper bound on generated tokens (`num_predict`)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            model: default_ollama_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl OllamaConfig {
    /// Apply `OLLAMA_API_BASE_URL` / `OLLAMA_MODEL` overrides
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("OLLAMA_API_BASE_URL") {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
        if let Ok(model) = std::env::var("OLLAMA_MODEL") {
            if !model.trim().is_empty() {
                self.model = model;
            }
        }
    }
}

/// Proactive insight generation settings
#[derive(Debug, Clone, Deserialize)]
pub struct InsightConfig {
    /// Trailing window sampled by the wellness snapshot
    #[serde(default = "default_window_days")]
    pub window_days: i64,

    /// Minimum spacing between two stored insights for the same user
    #[serde(default = "default_cooldown_hours")]
    pub cooldown_hours: i64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            cooldown_hours: default_cooldown_hours(),
        }
    }
}

/// Session lifetime settings
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_ttl")]
    pub ttl_hours: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_session_ttl(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_window_days() -> i64 {
    7
}

fn default_cooldown_hours() -> i64 {
    24
}

fn default_session_ttl() -> i64 {
    24 * 30
}

impl TomlConfig {
    /// Parse a TOML document
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load configuration
    ///
    /// An explicit path must exist and parse. Without one, the platform
    /// config file is used when present; otherwise defaults are returned.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let content = std::fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
            return Self::parse(&content);
        }

        match default_config_path() {
            Ok(path) => match std::fs::read_to_string(&path) {
                Ok(content) => {
                    info!("Loaded config file {}", path.display());
                    Self::parse(&content)
                }
                Err(e) => {
                    warn!("Config file {} unreadable ({}), using defaults", path.display(), e);
                    Ok(Self::default())
                }
            },
            Err(_) => Ok(Self::default()),
        }
    }
}

/// OS-dependent compiled defaults
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: default_log_level(),
        }
    }
}

/// Root folder resolution following the 4-tier priority order
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_value: None,
        }
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_value = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            info!("{}: root folder from command line: {}", self.module_name, path.display());
            return path.clone();
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!("{}: root folder from {}: {}", self.module_name, ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.toml_value {
            info!("{}: root folder from config file: {}", self.module_name, path.display());
            return path.clone();
        }

        // Priority 4: OS-dependent compiled default
        let path = default_root_folder();
        info!("{}: root folder from compiled default: {}", self.module_name, path.display());
        path
    }
}

/// Creates the root folder and names the files inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}

/// Get default configuration file path for the platform
fn default_config_path() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/lico/config.toml first, then /etc/lico/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("lico").join("config.toml"));
        let system_config = PathBuf::from("/etc/lico/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let path = dirs::config_dir()
        .map(|d| d.join("lico").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", path)))
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("lico"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/lico"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("lico"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/lico"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("lico"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\lico"))
    } else {
        PathBuf::from("./lico_data")
    }
}
