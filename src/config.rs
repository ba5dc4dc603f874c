//! Application configuration management.
//!
//! Settings are layered with [`figment`], later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config FILE`, or `config.toml` in the platform config dir)
//! 3. `PHOTODEDUP_*` environment variables (e.g. `PHOTODEDUP_MIN_SIZE=0`)
//! 4. CLI flags, applied by the caller on top of the loaded value
//!
//! ```toml
//! min_size = 1024
//! use_sample_hash = true
//! sample_size = 8192
//! io_threads = 4
//! keep = "oldest"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::{FinderConfig, RetentionPolicy, DEFAULT_IO_THREADS};
use crate::scanner::{DEFAULT_MIN_SIZE, DEFAULT_SAMPLE_SIZE};

/// Prefix of the environment variables read into the configuration.
pub const ENV_PREFIX: &str = "PHOTODEDUP_";

/// Errors from loading or saving the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// The layered configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// The configuration could not be serialized to TOML.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Reading or writing the config file failed.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path of the config file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Detection and retention settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Files below this size (bytes) are ignored
    pub min_size: u64,
    /// Whether to run the sample digest phase
    pub use_sample_hash: bool,
    /// Bytes sampled from each end of a file
    pub sample_size: u64,
    /// Concurrent digest workers
    pub io_threads: usize,
    /// Which copy `remove` keeps
    pub keep: RetentionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            use_sample_hash: true,
            sample_size: DEFAULT_SAMPLE_SIZE,
            io_threads: DEFAULT_IO_THREADS,
            keep: RetentionPolicy::default(),
        }
    }
}

impl Config {
    /// Load from the platform config file (if present) and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a layer holds a malformed value.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        Self::extract(path.as_deref())
    }

    /// Load from an explicit TOML file and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `path` does not exist, or
    /// [`ConfigError::Invalid`] if a layer holds a malformed value.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Self::extract(Some(path))
    }

    /// The layered provider chain, without extracting it.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    fn extract(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(p) = path {
            log::debug!("Loading configuration from {}", p.display());
        }
        let config: Self = Self::figment(path).extract().map_err(Box::new)?;
        log::trace!("Effective configuration: {:?}", config);
        Ok(config)
    }

    /// Write the configuration as TOML to the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(io_err)?;
        log::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Platform-specific path of `config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "photodedup", "photodedup")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Finder settings derived from this configuration.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_min_size(self.min_size)
            .with_sample_hash(self.use_sample_hash)
            .with_sample_size(self.sample_size)
            .with_io_threads(self.io_threads)
    }
}
