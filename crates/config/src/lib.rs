//! User configuration for the vdlv frontend and controller.
//!
//! Settings are read from a TOML file, by default
//! `<config dir>/vdlv/config.toml`. Every key is optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;

const APP_DIR: &str = "vdlv";
const FILE_NAME: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Address of the debugger backend.
    pub address: String,
    /// Prompt marker written to the scrollback and stripped from input.
    pub prompt: String,
    /// Lines kept visible above the focused line when a listing scrolls.
    pub scroll_context: usize,
    /// Minimum height of a breakpoint configuration row.
    pub min_config_rows: usize,
    /// Commands kept for history recall.
    pub history_limit: usize,
    /// Largest frame accepted from or sent to the backend, in bytes.
    pub max_frame_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: transport::DEFAULT_BACKEND_ADDRESS.to_string(),
            prompt: "(dlv)".to_string(),
            scroll_context: 10,
            min_config_rows: 2,
            history_limit: 500,
            max_frame_size: transport::DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl Config {
    /// Default location of the config file, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(FILE_NAME))
    }

    /// Load from `path`, or from [`Config::default_path`] when `path` is `None`.
    ///
    /// An explicit path must exist. A missing default file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                Some(path) => {
                    tracing::debug!(path = %path.display(), "no config file, using defaults");
                    Ok(Self::default())
                }
                None => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.prompt.trim().is_empty() {
            return Err(ConfigError::Invalid("prompt must not be blank".to_string()));
        }
        if self.min_config_rows == 0 {
            return Err(ConfigError::Invalid(
                "min_config_rows must be at least 1".to_string(),
            ));
        }
        if self.max_frame_size == 0 {
            return Err(ConfigError::Invalid(
                "max_frame_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
